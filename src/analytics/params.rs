use clap::ValueEnum;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Supply,
    Borrow,
    SupplyApy,
    BorrowApy,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::Supply,
        Field::Borrow,
        Field::SupplyApy,
        Field::BorrowApy,
    ];

    pub fn query_key(self) -> &'static str {
        match self {
            Self::Supply => "supply",
            Self::Borrow => "borrow",
            Self::SupplyApy => "supplyApy",
            Self::BorrowApy => "borrowApy",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum TimeWindow {
    #[value(name = "12h")]
    HalfDay,
    #[default]
    #[value(name = "1d")]
    Day,
    #[value(name = "1w")]
    Week,
}

impl TimeWindow {
    pub const ALL: [TimeWindow; 3] = [TimeWindow::HalfDay, TimeWindow::Day, TimeWindow::Week];

    pub fn minutes(self) -> u32 {
        match self {
            Self::HalfDay => 720,
            Self::Day => 1440,
            Self::Week => 10080,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::HalfDay => "LIVE",
            Self::Day => "1D",
            Self::Week => "1W",
        }
    }

    pub fn query(self) -> Vec<(&'static str, String)> {
        let mut query = Vec::with_capacity(Field::ALL.len() + 1);
        query.push(("minutes", self.minutes().to_string()));
        for field in Field::ALL {
            query.push((field.query_key(), "1".to_owned()));
        }
        query
    }
}

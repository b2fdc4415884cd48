use crate::analytics::{DeltaRecord, Field};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Supply,
    Borrow,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Supply, Mode::Borrow];

    pub fn label(self) -> &'static str {
        match self {
            Self::Supply => "SUPPLY",
            Self::Borrow => "BORROW",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Metric {
    #[default]
    DeltaTotal,
    DeltaApy,
    Apy,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::DeltaTotal, Metric::DeltaApy, Metric::Apy];

    pub fn label(self) -> &'static str {
        match self {
            Self::DeltaTotal => "FLOW",
            Self::DeltaApy => "APY CHANGE",
            Self::Apy => "APY",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Derived {
    pub value: f64,
    pub sign: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Derivation {
    SupplyFlow,
    BorrowFlow,
    SupplyApyChange,
    BorrowApyChange,
    SupplyApy,
    BorrowApy,
}

type DeriveFn = fn(&DeltaRecord) -> Derived;

const MIN_START: f64 = 0.0001;

fn relative_change(record: &DeltaRecord, field: Field) -> Derived {
    let start = record.start.get(field);
    let start = if start == 0.0 { MIN_START } else { start };
    let value = record.delta.get(field) / start;
    Derived {
        value,
        sign: value >= 0.0,
    }
}

fn apy_change(record: &DeltaRecord, field: Field) -> Derived {
    let value = record.delta.get(field);
    Derived {
        value,
        sign: value >= 0.0,
    }
}

// Both modes color absolute APY by the supply APY delta.
fn absolute_apy(record: &DeltaRecord, field: Field) -> Derived {
    Derived {
        value: record.end.get(field),
        sign: record.delta.get(Field::SupplyApy) >= 0.0,
    }
}

fn supply_flow(record: &DeltaRecord) -> Derived {
    relative_change(record, Field::Supply)
}

fn borrow_flow(record: &DeltaRecord) -> Derived {
    relative_change(record, Field::Borrow)
}

fn supply_apy_change(record: &DeltaRecord) -> Derived {
    apy_change(record, Field::SupplyApy)
}

fn borrow_apy_change(record: &DeltaRecord) -> Derived {
    apy_change(record, Field::BorrowApy)
}

fn supply_apy(record: &DeltaRecord) -> Derived {
    absolute_apy(record, Field::SupplyApy)
}

fn borrow_apy(record: &DeltaRecord) -> Derived {
    absolute_apy(record, Field::BorrowApy)
}

const DERIVATIONS: [(Derivation, DeriveFn); 6] = [
    (Derivation::SupplyFlow, supply_flow),
    (Derivation::BorrowFlow, borrow_flow),
    (Derivation::SupplyApyChange, supply_apy_change),
    (Derivation::BorrowApyChange, borrow_apy_change),
    (Derivation::SupplyApy, supply_apy),
    (Derivation::BorrowApy, borrow_apy),
];

impl Derivation {
    pub fn select(mode: Mode, metric: Metric) -> Self {
        match (mode, metric) {
            (Mode::Supply, Metric::DeltaTotal) => Self::SupplyFlow,
            (Mode::Borrow, Metric::DeltaTotal) => Self::BorrowFlow,
            (Mode::Supply, Metric::DeltaApy) => Self::SupplyApyChange,
            (Mode::Borrow, Metric::DeltaApy) => Self::BorrowApyChange,
            (Mode::Supply, Metric::Apy) => Self::SupplyApy,
            (Mode::Borrow, Metric::Apy) => Self::BorrowApy,
        }
    }

    pub fn metric(self) -> Metric {
        match self {
            Self::SupplyFlow | Self::BorrowFlow => Metric::DeltaTotal,
            Self::SupplyApyChange | Self::BorrowApyChange => Metric::DeltaApy,
            Self::SupplyApy | Self::BorrowApy => Metric::Apy,
        }
    }

    pub fn series_field(self) -> Field {
        match self {
            Self::SupplyFlow => Field::Supply,
            Self::BorrowFlow => Field::Borrow,
            Self::SupplyApyChange | Self::SupplyApy => Field::SupplyApy,
            Self::BorrowApyChange | Self::BorrowApy => Field::BorrowApy,
        }
    }

    pub fn derive(self, record: &DeltaRecord) -> Derived {
        DERIVATIONS
            .iter()
            .find(|(derivation, _)| *derivation == self)
            .map(|(_, derive)| derive(record))
            .unwrap_or(Derived {
                value: 0.0,
                sign: true,
            })
    }
}

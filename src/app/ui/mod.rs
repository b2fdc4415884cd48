mod dialog;
mod header;
mod tooltip;

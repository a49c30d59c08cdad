mod bar;
mod most_active;
mod session;
mod symbol;

pub use bar::BarRecord;
pub use most_active::MostActiveRecord;
pub use session::{minute_grid, TradingSession};
pub use symbol::{Product, SymbolRef, Ticker};

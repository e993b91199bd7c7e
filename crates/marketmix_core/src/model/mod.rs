mod exchange;
mod ids;
mod market;
mod package;
mod uncertainty;

pub use exchange::{Activity, AmountShift, Exchange, ExchangeKind};
pub use ids::{ActivityId, Index};
pub use market::{Market, MarketSet, ShareBand};
pub use package::{SampleMatrix, SamplePackage};
pub use uncertainty::{Uncertainty, beta_variance, lognormal_variance};

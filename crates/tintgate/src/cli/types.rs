//! CLI enum types shared by the tinting commands.

use clap::ValueEnum;
use tintgate_core::TintStrategy;

/// Tint algorithms selectable on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Integer tint with shadows lifted (default)
    Label,
    /// Integer tint pinned at lightness 0.5
    Lightness,
    /// Keep each pixel's lightness and chroma, take the hue only
    Saturation,
    /// Floating-point HLS round trip
    Hls,
}

impl From<StrategyArg> for TintStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Label => TintStrategy::Label,
            StrategyArg::Lightness => TintStrategy::Lightness,
            StrategyArg::Saturation => TintStrategy::Saturation,
            StrategyArg::Hls => TintStrategy::Hls,
        }
    }
}

impl std::fmt::Display for StrategyArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", TintStrategy::from(*self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_arg_names_match_core() {
        for arg in StrategyArg::value_variants() {
            let name = arg.to_possible_value().unwrap().get_name().to_string();
            assert_eq!(name, TintStrategy::from(*arg).name());
        }
    }
}

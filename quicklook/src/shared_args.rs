use clap::{Args, ValueEnum};
use shared::viz::Stretch;
use shared::sequence::DEFAULT_TIMESTAMP_KEY;
use shared::SequenceOrder;
use std::path::PathBuf;

/// Parse a percentile in `[0, 100]`
pub fn parse_percentile(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid percentile: {}", s))?;
    if !(0.0..=100.0).contains(&value) {
        return Err(format!("Percentile must be between 0 and 100, got {}", value));
    }
    Ok(value)
}

/// Parse a non-negative, finite Gaussian sigma in pixels
pub fn parse_sigma(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid sigma: {}", s))?;
    if !value.is_finite() || value < 0.0 {
        return Err("Sigma must be a non-negative number".to_string());
    }
    Ok(value)
}

/// Stretch functions for display previews
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StretchArg {
    /// Linear mapping of the clipped range
    Linear,
    /// Square root, lifts faint structure
    Sqrt,
    /// Logarithmic, strongest compression of bright values
    Log,
    /// Inverse hyperbolic sine
    Asinh,
}

impl std::fmt::Display for StretchArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StretchArg::Linear => write!(f, "linear"),
            StretchArg::Sqrt => write!(f, "sqrt"),
            StretchArg::Log => write!(f, "log"),
            StretchArg::Asinh => write!(f, "asinh"),
        }
    }
}

impl From<StretchArg> for Stretch {
    fn from(arg: StretchArg) -> Self {
        match arg {
            StretchArg::Linear => Stretch::Linear,
            StretchArg::Sqrt => Stretch::Sqrt,
            StretchArg::Log => Stretch::Log,
            StretchArg::Asinh => Stretch::Asinh,
        }
    }
}

/// Loading and saving of a JSON run configuration
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigFileArgs {
    /// JSON configuration to start from; explicit flags override its fields
    #[arg(long, value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// Write the resolved configuration to this file before running
    #[arg(long, value_name = "JSON")]
    pub save_config: Option<PathBuf>,
}

/// Display percentile overrides
#[derive(Args, Debug, Clone, Default)]
pub struct PercentileArgs {
    /// Low display percentile (default 5)
    #[arg(long, value_parser = parse_percentile)]
    pub percentile_low: Option<f64>,

    /// High display percentile (default 99.9)
    #[arg(long, value_parser = parse_percentile)]
    pub percentile_high: Option<f64>,
}

impl PercentileArgs {
    /// Overwrite the given bounds with any values set on the command line
    pub fn apply_to(&self, low: &mut f64, high: &mut f64) {
        if let Some(value) = self.percentile_low {
            *low = value;
        }
        if let Some(value) = self.percentile_high {
            *high = value;
        }
    }
}

/// Sequence discovery overrides
#[derive(Args, Debug, Clone, Default)]
pub struct SequenceArgs {
    /// Search subdirectories for FITS files (true/false)
    #[arg(long, value_name = "BOOL")]
    pub recursive: Option<bool>,

    /// Order frames by a header timestamp instead of by file name; the key
    /// defaults to DATE-OBS when the flag is given without a value
    #[arg(
        long,
        value_name = "KEY",
        num_args = 0..=1,
        default_missing_value = DEFAULT_TIMESTAMP_KEY
    )]
    pub timestamp_key: Option<String>,
}

impl SequenceArgs {
    pub fn apply_to(&self, recursive: &mut bool, ordering: &mut SequenceOrder) {
        if let Some(value) = self.recursive {
            *recursive = value;
        }
        if let Some(key) = &self.timestamp_key {
            *ordering = SequenceOrder::HeaderTimestamp { key: key.clone() };
        }
    }
}

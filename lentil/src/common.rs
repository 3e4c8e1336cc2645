#![allow(unused)]

pub use sblock::io::{Format, LoadOptions};
pub use sblock::{Blockmodel, ModelVariant};

pub use mcmc_util::{ConvergenceCriterion, EntropyConvergenceCriterion, RandomSource};

pub use clap::{Parser, ValueEnum};

pub use log::{debug, error, info, warn};

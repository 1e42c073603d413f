use clap::{Args, Subcommand, ValueEnum};

/// Available Kiln subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run one pipeline, or all of them, once
    ///
    /// Exits with status 1 if any pipeline fails.
    Build(BuildArgs),

    /// Watch sources and rebuild on change
    ///
    /// Starts the reload endpoint so open pages refresh after each
    /// successful rebuild. Runs until Ctrl+C.
    Watch(WatchArgs),

    /// Serve the output directory over HTTP
    ///
    /// HTML pages get the live-reload client injected.
    Serve(ServeArgs),

    /// Build everything, then watch and serve
    Dev(DevArgs),
}

/// Which pipeline(s) a one-shot build runs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum BuildTarget {
    /// JavaScript bundle
    Scripts,
    /// SCSS to CSS
    Styles,
    /// HTML copy
    Markup,
    /// Image copy
    Images,
    /// Every pipeline, concurrently
    All,
}

impl BuildTarget {
    /// Pipeline name, or `None` for [`BuildTarget::All`].
    pub fn pipeline_name(&self) -> Option<&'static str> {
        match self {
            BuildTarget::Scripts => Some("scripts"),
            BuildTarget::Styles => Some("styles"),
            BuildTarget::Markup => Some("markup"),
            BuildTarget::Images => Some("images"),
            BuildTarget::All => None,
        }
    }
}

/// Flags that override configuration values.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigArgs {
    /// Build for production (minified scripts, no source maps)
    #[arg(long)]
    pub production: bool,

    /// Port of the live-reload endpoint
    #[arg(long, value_name = "PORT")]
    pub reload_port: Option<u16>,

    /// Port of the dev server
    #[arg(long, value_name = "PORT")]
    pub server_port: Option<u16>,
}

/// Arguments for the build command
#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Pipeline to run
    #[arg(value_enum, default_value = "all")]
    pub target: BuildTarget,

    #[command(flatten)]
    pub overrides: ConfigArgs,
}

/// Arguments for the watch command
#[derive(Args, Debug, Clone, Default)]
pub struct WatchArgs {
    #[command(flatten)]
    pub overrides: ConfigArgs,
}

/// Arguments for the serve command
#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ConfigArgs,
}

/// Arguments for the dev command
#[derive(Args, Debug, Clone, Default)]
pub struct DevArgs {
    #[command(flatten)]
    pub overrides: ConfigArgs,
}

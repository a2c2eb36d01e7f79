use clap::ValueEnum;
use heft_stats::{InstallClient, Minifier};

/// Package manager used for installs
#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub enum Client {
    #[value(name = "npm")]
    Npm,
    #[value(name = "yarn")]
    Yarn,
    #[value(name = "pnpm")]
    Pnpm,
}

/// Minifier backend
#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub enum MinifierKind {
    /// Full compression; slower, closest to production output
    #[value(name = "compress", alias = "terser")]
    Compress,

    /// Whitespace removal and mangling only
    #[value(name = "fast", alias = "esbuild")]
    Fast,
}

impl From<Client> for InstallClient {
    fn from(client: Client) -> Self {
        match client {
            Client::Npm => InstallClient::Npm,
            Client::Yarn => InstallClient::Yarn,
            Client::Pnpm => InstallClient::Pnpm,
        }
    }
}

impl From<MinifierKind> for Minifier {
    fn from(kind: MinifierKind) -> Self {
        match kind {
            MinifierKind::Compress => Minifier::Compress,
            MinifierKind::Fast => Minifier::Fast,
        }
    }
}

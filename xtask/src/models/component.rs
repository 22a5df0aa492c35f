/// Buildable parts of the workspace, listed in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Simulator,
    Soem,
    TwinCat,
    Main,
}

impl Component {
    pub const ALL: [Self; 4] = [Self::Simulator, Self::Soem, Self::TwinCat, Self::Main];

    /// Key used for this component in `xtask.toml` and in log output.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Simulator => "simulator",
            Self::Soem => "soem",
            Self::TwinCat => "twincat",
            Self::Main => "main",
        }
    }

    /// Executables the main app bundles as sidecars, without platform suffix.
    #[must_use]
    pub const fn sidecars() -> [&'static str; 4] {
        ["simulator-unity", "simulator", "SOEMAUTDServer", "TwinCATAUTDServerLightweight"]
    }
}

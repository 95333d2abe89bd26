//! Chat command vocabulary
//!
//! Maps a slash-prefixed command to either one column of the latest row or a
//! named group of other commands.

/// What a command resolves to
#[derive(Debug, Clone, PartialEq)]
pub enum CommandEntry {
    /// A single column value
    Direct {
        index: usize,
        unit: String,
        name: String,
    },
    /// A named group of other commands, referenced by key
    Composite { refs: Vec<String>, name: String },
}

impl CommandEntry {
    pub fn direct(index: usize, unit: impl Into<String>, name: impl Into<String>) -> Self {
        CommandEntry::Direct {
            index,
            unit: unit.into(),
            name: name.into(),
        }
    }

    pub fn composite(refs: &[&str], name: impl Into<String>) -> Self {
        CommandEntry::Composite {
            refs: refs.iter().map(|r| (*r).to_string()).collect(),
            name: name.into(),
        }
    }

    /// Display name
    pub fn name(&self) -> &str {
        match self {
            CommandEntry::Direct { name, .. } | CommandEntry::Composite { name, .. } => name,
        }
    }

    /// Unit string; always empty for composites
    pub fn unit(&self) -> &str {
        match self {
            CommandEntry::Direct { unit, .. } => unit,
            CommandEntry::Composite { .. } => "",
        }
    }
}

/// Ordered command table. Insertion order drives the help listing.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandTable {
    entries: Vec<(String, CommandEntry)>,
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::labsense()
    }
}

impl CommandTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add or replace an entry. Replacing keeps the existing position.
    pub fn insert(&mut self, key: impl Into<String>, entry: CommandEntry) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = entry,
            None => self.entries.push((key, entry)),
        }
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with(mut self, key: impl Into<String>, entry: CommandEntry) -> Self {
        self.insert(key, entry);
        self
    }

    /// Exact-key lookup; callers normalize first
    pub fn get(&self, key: &str) -> Option<&CommandEntry> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, entry)| entry)
    }

    /// Keys in table order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Composite references that name no entry, as `(composite, reference)`
    pub fn dangling_refs(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(key, entry)| match entry {
                CommandEntry::Composite { refs, .. } => Some((key, refs)),
                CommandEntry::Direct { .. } => None,
            })
            .flat_map(|(key, refs)| {
                refs.iter()
                    .filter(|r| self.get(r).is_none())
                    .map(move |r| (key.as_str(), r.as_str()))
            })
            .collect()
    }

    /// The LABSense vocabulary
    ///
    /// `/mq7` lists `/co2` twice and `/anemometro` points at `/velocidad`,
    /// which has no entry. Both are kept as deployed.
    pub fn labsense() -> Self {
        Self::new()
            .with("/temperatura", CommandEntry::direct(1, "°C", "Temperatura"))
            .with("/humedad", CommandEntry::direct(2, "%", "Humedad"))
            .with("/lpg", CommandEntry::direct(3, "ppm", "Gas LPG"))
            .with("/h2", CommandEntry::direct(4, "ppm", "Hidrógeno (H2)"))
            .with("/humo", CommandEntry::direct(5, "ppm", "Humo"))
            .with("/benceno", CommandEntry::direct(6, "mg/L", "Benceno"))
            .with("/alcohol", CommandEntry::direct(7, "mg/L", "Alcohol"))
            .with("/co", CommandEntry::direct(8, "ppm", "Monóxido de Carbono (CO)"))
            .with("/co2", CommandEntry::direct(9, "ppm", "Dióxido de Carbono (CO2)"))
            .with("/amoniaco", CommandEntry::direct(10, "ppm", "Amoníaco"))
            .with("/tolueno", CommandEntry::direct(11, "ppm", "Tolueno"))
            .with(
                "/ica",
                CommandEntry::direct(12, "", "Índice de Calidad del Aire (ICA)"),
            )
            .with(
                "/dht22",
                CommandEntry::composite(&["/temperatura", "/humedad"], "Sensor DHT22"),
            )
            .with(
                "/mq2",
                CommandEntry::composite(&["/lpg", "/h2", "/humo"], "Sensor MQ-2"),
            )
            .with(
                "/mq3",
                CommandEntry::composite(&["/alcohol", "/benceno"], "Sensor MQ-3"),
            )
            .with(
                "/mq7",
                CommandEntry::composite(&["/co2", "/co2"], "Sensor MQ-7"),
            )
            .with(
                "/mq135",
                CommandEntry::composite(
                    &["/co2", "/amoniaco", "/tolueno", "/ica"],
                    "Sensor MQ-135",
                ),
            )
            .with(
                "/anemometro",
                CommandEntry::composite(&["/velocidad"], "Anemómetro"),
            )
    }
}

use serde::Serialize;

/// A breakpoint-set request as the stub recorded it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakpointRecord {
    /// `Z` type field (0 = software breakpoint)
    pub kind: Option<u8>,
    /// Address, when the request carried a parseable one
    pub address: Option<u64>,
    /// Raw `<type>,<addr>,<kind>` payload
    pub spec: String,
    /// Always true: the stub never refuses a breakpoint
    pub set: bool,
}

impl BreakpointRecord {
    fn parse(spec: &str) -> Self {
        let mut parts = spec.split(',');
        let kind = parts.next().and_then(|t| t.parse::<u8>().ok());
        let address = parts.next().and_then(|a| u64::from_str_radix(a, 16).ok());
        Self {
            kind,
            address,
            spec: spec.to_string(),
            set: true,
        }
    }
}

/// Append-only log of breakpoint requests.
///
/// Nothing is validated: malformed specs and unsupported breakpoint types
/// are recorded and acknowledged like any other. A real target would reject
/// those; the scripted stop stream decides where execution halts, so the
/// table only has to keep the client happy and remember what it asked for.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct BreakpointTable {
    records: Vec<BreakpointRecord>,
}

impl BreakpointTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a `Z` request and acknowledge it.
    pub fn set_breakpoint(&mut self, spec: &str) -> String {
        self.records.push(BreakpointRecord::parse(spec));
        "OK".to_string()
    }

    /// Acknowledge a `z` request. Records are kept.
    pub fn remove_breakpoint(&self, _spec: &str) -> String {
        "OK".to_string()
    }

    pub fn records(&self) -> &[BreakpointRecord] {
        &self.records
    }

    /// Whether a breakpoint was ever requested at `addr`
    pub fn is_breakpoint(&self, addr: u64) -> bool {
        self.records.iter().any(|r| r.address == Some(addr))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

//! CSI parameter parsing
//!
//! Parameters are `;`-separated numbers; each may carry `:`-separated
//! sub-parameters (SGR extended colors). An omitted value is 0, which
//! most sequences read as "use the default".

/// Maximum number of parameters in one sequence
pub const MAX_PARAMS: usize = 32;

/// CSI parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    /// First value of each parameter (0 when omitted)
    values: Vec<u32>,
    /// Remaining `:`-separated values of each parameter
    subparams: Vec<Vec<u32>>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create params from a slice
    pub fn from_slice(values: &[u32]) -> Self {
        Self {
            values: values.to_vec(),
            subparams: vec![Vec::new(); values.len()],
        }
    }

    /// Parse the collected parameter bytes. Values saturate at `u32::MAX`;
    /// parameters past [`MAX_PARAMS`] are dropped.
    pub fn parse(bytes: &[u8]) -> Self {
        let mut params = Self::new();
        if bytes.is_empty() {
            return params;
        }
        for group in bytes.split(|&b| b == b';').take(MAX_PARAMS) {
            let mut parts = group.split(|&b| b == b':').map(parse_number);
            params.values.push(parts.next().unwrap_or(0));
            params.subparams.push(parts.collect());
        }
        params
    }

    /// Parameter at index, None if missing or 0
    pub fn get(&self, index: usize) -> Option<u32> {
        self.values.get(index).copied().filter(|&v| v != 0)
    }

    /// Parameter at index, substituting `default` for missing or 0
    pub fn get_or(&self, index: usize, default: u32) -> u32 {
        self.get(index).unwrap_or(default)
    }

    /// Raw value at index; an explicit 0 is kept
    pub fn raw(&self, index: usize) -> Option<u32> {
        self.values.get(index).copied()
    }

    pub fn values(&self) -> &[u32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sub-parameters following the value at index
    pub fn subparams(&self, index: usize) -> &[u32] {
        self.subparams.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.values.iter().copied()
    }
}

fn parse_number(digits: &[u8]) -> u32 {
    digits
        .iter()
        .filter(|b| b.is_ascii_digit())
        .fold(0u32, |acc, &b| acc.saturating_mul(10).saturating_add(u32::from(b - b'0')))
}

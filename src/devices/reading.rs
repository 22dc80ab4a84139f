use std::fmt;

/// One scalar value of a reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Register(u16),
    Text(String),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Register(value) => write!(f, "{}", value),
            Field::Text(text) => f.write_str(text),
            Field::Timestamp(millis) => write!(f, "{}", millis),
        }
    }
}

/// The fields produced by a single poll, in poll order. Once built a reading
/// is only ever extended by its timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reading {
    fields: Vec<Field>,
}

impl Reading {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn from_registers(registers: Vec<u16>) -> Self {
        Self::new(registers.into_iter().map(Field::Register).collect())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![Field::Text(text.into())])
    }

    pub fn with_timestamp(mut self, unix_millis: i64) -> Self {
        self.fields.push(Field::Timestamp(unix_millis));
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn timestamp(&self) -> Option<i64> {
        match self.fields.last() {
            Some(Field::Timestamp(millis)) => Some(*millis),
            _ => None,
        }
    }

    /// Renders the reading as one sink record.
    pub fn to_record(&self) -> Vec<String> {
        self.fields.iter().map(|field| field.to_string()).collect()
    }
}

pub fn unix_millis_now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

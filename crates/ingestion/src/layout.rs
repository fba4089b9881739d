//! Record layouts of Bela log files

use contracts::codec::F32_WIDTH;

/// Field holding the device's elapsed frame counter
pub const FRAMES_FIELD: &str = "framesElapsed";

/// Field holding the clock-signal message value
pub const MESSAGE_FIELD: &str = "msg";

/// Ordered named fields of one fixed-width record
///
/// Every field is a 4-byte little-endian `f32`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLayout {
    fields: Vec<String>,
}

impl RecordLayout {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// `[framesElapsed, msg]`
    pub fn sync() -> Self {
        Self::new([FRAMES_FIELD, MESSAGE_FIELD])
    }

    /// `[framesElapsed, {id}-x1, ..., {id}-xN]`
    pub fn sensor(device_id: &str, num_sensors: usize) -> Self {
        let mut fields = Vec::with_capacity(num_sensors + 1);
        fields.push(FRAMES_FIELD.to_string());
        fields.extend((1..=num_sensors).map(|n| format!("{device_id}-x{n}")));
        Self { fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    /// Bytes per record
    pub fn record_width(&self) -> usize {
        self.fields.len() * F32_WIDTH
    }
}

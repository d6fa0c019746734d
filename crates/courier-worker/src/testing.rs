//! Helpers for asserting on the frames a worker produced.

use courier_protocol::{ErrorCode, Notification};

/// Tally of one operation's notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationSummary {
    /// Number of `finished` frames.
    pub finished: usize,
    /// Codes of the `error` frames, in order.
    pub errors: Vec<ErrorCode>,
    /// Non-empty `data` frames.
    pub data_chunks: usize,
    /// Empty `data` frames.
    pub end_of_data: usize,
    /// Payload bytes across all `data` frames.
    pub bytes: usize,
    /// Whether a non-empty `data` frame followed an end-of-stream marker.
    pub data_after_end: bool,
}

impl OperationSummary {
    /// Returns the total number of `finished` and `error` frames.
    #[must_use]
    pub const fn results(&self) -> usize {
        self.finished + self.errors.len()
    }

    /// Returns `true` for exactly one `finished` and no `error`.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.finished == 1 && self.errors.is_empty()
    }
}

impl From<&[Notification]> for OperationSummary {
    fn from(frames: &[Notification]) -> Self {
        let mut summary = Self::default();
        for frame in frames {
            match frame {
                Notification::Finished => summary.finished += 1,
                Notification::Error { code, .. } => summary.errors.push(*code),
                Notification::Data { data } if data.is_empty() => summary.end_of_data += 1,
                Notification::Data { data } => {
                    summary.data_chunks += 1;
                    summary.bytes += data.len();
                    summary.data_after_end |= summary.end_of_data > 0;
                }
                _ => {}
            }
        }
        summary
    }
}

/// Concatenates the payloads of every `data` frame.
#[must_use]
pub fn collect_data(frames: &[Notification]) -> Vec<u8> {
    frames
        .iter()
        .filter_map(|frame| match frame {
            Notification::Data { data } => Some(data.as_slice()),
            _ => None,
        })
        .flatten()
        .copied()
        .collect()
}

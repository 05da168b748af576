use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_defence_core::{CellCoord, TowerKind, TowerView};

const SNAPSHOT_DOMAIN: &str = "towers";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded snapshot payload.
pub(crate) const SNAPSHOT_HEADER: &str = "towers:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Snapshot of the towers standing on a board of known dimensions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct TowerLayoutSnapshot {
    /// Number of cell columns on the board.
    pub(crate) columns: u32,
    /// Number of cell rows on the board.
    pub(crate) rows: u32,
    /// Towers composing the layout captured by the snapshot.
    pub(crate) towers: Vec<TowerLayoutTower>,
}

impl TowerLayoutSnapshot {
    /// Captures every tower of a board, in identifier order.
    pub(crate) fn capture(columns: u32, rows: u32, towers: &TowerView) -> Self {
        Self {
            columns,
            rows,
            towers: towers
                .iter()
                .map(|tower| TowerLayoutTower {
                    kind: tower.kind,
                    origin: tower.region.origin(),
                    level: tower.level,
                })
                .collect(),
        }
    }

    /// Encodes the snapshot into a single-line string suitable for copying.
    pub(crate) fn encode(&self) -> Result<String, LayoutTransferError> {
        let payload = SerializableSnapshot {
            towers: self.towers.clone(),
        };
        let json = serde_json::to_vec(&payload).map_err(LayoutTransferError::Serialize)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!(
            "{SNAPSHOT_HEADER}:{}x{}:{encoded}",
            self.columns, self.rows
        ))
    }

    /// Decodes a snapshot from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, LayoutTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LayoutTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(LayoutTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(LayoutTransferError::MissingVersion)?;
        let dimensions = parts.next().ok_or(LayoutTransferError::MissingDimensions)?;
        let payload = parts.next().ok_or(LayoutTransferError::MissingPayload)?;

        if domain != SNAPSHOT_DOMAIN {
            return Err(LayoutTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(LayoutTransferError::UnsupportedVersion(version.to_owned()));
        }

        let (columns, rows) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(LayoutTransferError::InvalidEncoding)?;
        let decoded: SerializableSnapshot =
            serde_json::from_slice(&bytes).map_err(LayoutTransferError::InvalidPayload)?;

        Ok(Self {
            columns,
            rows,
            towers: decoded.towers,
        })
    }
}

/// Tower description captured within a layout snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct TowerLayoutTower {
    /// Type of tower represented by the snapshot.
    pub(crate) kind: TowerKind,
    /// Lowest-indexed cell anchoring the tower's footprint.
    pub(crate) origin: CellCoord,
    /// Upgrade level, counting from zero.
    #[serde(default)]
    pub(crate) level: u8,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializableSnapshot {
    towers: Vec<TowerLayoutTower>,
}

/// Errors that can occur while encoding or decoding layout transfer strings.
#[derive(Debug, Error)]
pub(crate) enum LayoutTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("layout string was empty")]
    EmptyPayload,
    /// The prefix segment was missing from the encoded snapshot.
    #[error("layout string is missing the prefix")]
    MissingPrefix,
    /// The encoded snapshot did not contain a version segment.
    #[error("layout string is missing the version")]
    MissingVersion,
    /// The encoded snapshot did not include grid dimensions.
    #[error("layout string is missing the grid dimensions")]
    MissingDimensions,
    /// The encoded snapshot did not include the payload segment.
    #[error("layout string is missing the payload")]
    MissingPayload,
    /// The encoded snapshot used an unexpected prefix segment.
    #[error("layout prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The encoded snapshot used an unsupported version identifier.
    #[error("layout version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed from the encoded snapshot.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode layout payload")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The decoded payload could not be deserialised.
    #[error("could not parse layout payload")]
    InvalidPayload(#[source] serde_json::Error),
    /// The layout could not be serialised.
    #[error("could not serialise layout")]
    Serialize(#[source] serde_json::Error),
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LayoutTransferError> {
    let invalid = || LayoutTransferError::InvalidDimensions(dimensions.to_owned());
    let (columns, rows) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let columns = columns.trim().parse::<u32>().map_err(|_| invalid())?;
    let rows = rows.trim().parse::<u32>().map_err(|_| invalid())?;

    if columns == 0 || rows == 0 {
        return Err(invalid());
    }

    Ok((columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn populated_layout_survives_transfer() {
        let snapshot = TowerLayoutSnapshot {
            columns: 20,
            rows: 15,
            towers: vec![
                TowerLayoutTower {
                    kind: TowerKind::Cannon,
                    origin: CellCoord::new(5, 7),
                    level: 2,
                },
                TowerLayoutTower {
                    kind: TowerKind::Heavy,
                    origin: CellCoord::new(12, 4),
                    level: 0,
                },
            ],
        };

        let encoded = snapshot.encode().expect("snapshot encodes");
        assert!(encoded.starts_with(&format!("{SNAPSHOT_HEADER}:20x15:")));

        let decoded = TowerLayoutSnapshot::decode(&encoded).expect("snapshot decodes");
        assert_eq!(snapshot, decoded);
    }

    #[test]
    fn malformed_strings_are_rejected() {
        assert!(matches!(
            TowerLayoutSnapshot::decode("   "),
            Err(LayoutTransferError::EmptyPayload)
        ));
        assert!(matches!(
            TowerLayoutSnapshot::decode("board:v1:4x4:e30"),
            Err(LayoutTransferError::InvalidPrefix(prefix)) if prefix == "board"
        ));
        assert!(matches!(
            TowerLayoutSnapshot::decode("towers:v2:4x4:e30"),
            Err(LayoutTransferError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            TowerLayoutSnapshot::decode("towers:v1:0x4:e30"),
            Err(LayoutTransferError::InvalidDimensions(_))
        ));
        assert!(matches!(
            TowerLayoutSnapshot::decode("towers:v1:4x4"),
            Err(LayoutTransferError::MissingPayload)
        ));
        assert!(matches!(
            TowerLayoutSnapshot::decode("towers:v1:4x4:!!"),
            Err(LayoutTransferError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn missing_levels_default_to_zero() {
        let json = br#"{"towers":[{"kind":"Fast","origin":{"column":3,"row":2}}]}"#;
        let encoded = format!("{SNAPSHOT_HEADER}:8x6:{}", STANDARD_NO_PAD.encode(json));
        let decoded = TowerLayoutSnapshot::decode(&encoded).expect("snapshot decodes");
        assert_eq!(
            decoded.towers,
            vec![TowerLayoutTower {
                kind: TowerKind::Fast,
                origin: CellCoord::new(3, 2),
                level: 0,
            }]
        );
    }
}

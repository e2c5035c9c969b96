use crate::core::{BonusId, CondDoorKind, KeyId, Position, TeleportId};

/// A stateful mechanic triggered by a single move.
///
/// Events carry the cell that triggered them so that the analyzer can tell
/// individual tile instances apart.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    derive_more::Display,
    derive_more::IsVariant,
    serde::Serialize,
)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MechanicEvent {
    #[display("picked up key {key} at {position}")]
    KeyPickup { key: KeyId, position: Position },
    #[display("opened door {key} at {position}")]
    DoorPassed { key: KeyId, position: Position },
    #[display("passed {kind} door at {position}")]
    CondDoorPassed {
        kind: CondDoorKind,
        position: Position,
    },
    #[display("passed gate at {position}")]
    GatePassed { position: Position },
    #[display("toggled switch at {position} (now {})", if *on { "on" } else { "off" })]
    SwitchToggled { position: Position, on: bool },
    #[display("teleported {from} -> {to}")]
    Teleported {
        pair: TeleportId,
        from: Position,
        to: Position,
    },
    #[display("pushed block {block} {from} -> {to}")]
    BlockPushed {
        block: usize,
        from: Position,
        to: Position,
    },
    #[display("stepped on trap at {position}")]
    TrapEntered { position: Position },
    #[display("reached bonus exit {bonus} at {position}")]
    BonusReached { bonus: BonusId, position: Position },
    #[display("reached end at {position}")]
    EndReached { position: Position },
}

impl MechanicEvent {
    /// Cell whose tile triggered the event.
    #[must_use]
    pub fn position(self) -> Position {
        match self {
            MechanicEvent::KeyPickup { position, .. }
            | MechanicEvent::DoorPassed { position, .. }
            | MechanicEvent::CondDoorPassed { position, .. }
            | MechanicEvent::GatePassed { position }
            | MechanicEvent::SwitchToggled { position, .. }
            | MechanicEvent::TrapEntered { position }
            | MechanicEvent::BonusReached { position, .. }
            | MechanicEvent::EndReached { position } => position,
            MechanicEvent::Teleported { from, .. } | MechanicEvent::BlockPushed { from, .. } => {
                from
            }
        }
    }
}

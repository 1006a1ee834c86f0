use crate::error::ActionError;

/// Number of discrete actions: every combination of the three flags.
pub const ACTION_COUNT: usize = 8;

/// Flag vectors indexed by discrete action, `[forward, backward, jump]`.
const ACTION_TABLE: [[u8; 3]; ACTION_COUNT] = [
    [0, 0, 0],
    [1, 0, 0],
    [0, 1, 0],
    [0, 0, 1],
    [1, 1, 0],
    [1, 0, 1],
    [0, 1, 1],
    [1, 1, 1],
];

/// Multi-binary action understood by the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ActionFlags {
    pub forward: bool,
    pub backward: bool,
    pub jump: bool,
}

impl ActionFlags {
    pub const IDLE: ActionFlags = ActionFlags {
        forward: false,
        backward: false,
        jump: false,
    };

    /// Flags as a 0/1 vector in `[forward, backward, jump]` order.
    pub fn to_binary(self) -> [u8; 3] {
        [self.forward as u8, self.backward as u8, self.jump as u8]
    }

    /// Discrete index of these flags. Total, since every combination is mapped.
    pub fn index(self) -> usize {
        let bits = self.to_binary();
        ACTION_TABLE
            .iter()
            .position(|row| *row == bits)
            .unwrap_or_else(|| unreachable!("action table covers all flag combinations"))
    }
}

/// Map a discrete action index onto its flag vector.
pub fn decode(index: usize) -> Result<ActionFlags, ActionError> {
    let row = ACTION_TABLE.get(index).ok_or(ActionError::IndexOutOfRange {
        index,
        count: ACTION_COUNT,
    })?;
    Ok(ActionFlags {
        forward: row[0] == 1,
        backward: row[1] == 1,
        jump: row[2] == 1,
    })
}

/// Inverse of [`decode`]: the unique index whose flags equal `vector`.
pub fn encode(vector: &[u8]) -> Result<usize, ActionError> {
    if vector.len() != 3 || vector.iter().any(|&v| v > 1) {
        return Err(ActionError::MalformedVector(vector.to_vec()));
    }
    ACTION_TABLE
        .iter()
        .position(|row| row.as_slice() == vector)
        .ok_or_else(|| ActionError::MalformedVector(vector.to_vec()))
}

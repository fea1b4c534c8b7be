use crate::{BUFFER_SIZE, SampleBuffer};

/// Which of the two ping-pong buffers
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub enum BufferRole {
    /// The buffer the hardware starts draining first
    #[default]
    Primary = 0,
    /// The buffer the hardware drains after the primary one
    Alternate = 1,
}

impl BufferRole {
    /// The other buffer
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::Primary => Self::Alternate,
            Self::Alternate => Self::Primary,
        }
    }
    const fn idx(self) -> usize {
        self as usize
    }
}

/// Two sample buffers, one drained by the hardware while the other is refilled.
///
/// Swapping roles flips [`Self::active`], the samples never move.
pub struct PingPong {
    bufs: [SampleBuffer; 2],
    active: BufferRole,
}

impl Default for PingPong {
    fn default() -> Self {
        Self {
            bufs: [[0; BUFFER_SIZE]; 2],
            active: BufferRole::Primary,
        }
    }
}

impl PingPong {
    /// The buffer currently being drained by the hardware
    #[must_use]
    pub const fn active(&self) -> BufferRole {
        self.active
    }
    /// The buffer currently available for refilling
    #[must_use]
    pub const fn standby(&self) -> BufferRole {
        self.active.flip()
    }
    /// Hand the active role over to the other buffer
    pub const fn swap(&mut self) {
        self.active = self.active.flip();
    }
    /// Samples of the buffer with `role`
    #[must_use]
    pub const fn buffer(&self, role: BufferRole) -> &SampleBuffer {
        &self.bufs[role.idx()]
    }
    /// Mutable samples of the buffer with `role`
    pub const fn buffer_mut(&mut self, role: BufferRole) -> &mut SampleBuffer {
        &mut self.bufs[role.idx()]
    }
    /// Both buffers, primary first
    #[must_use]
    pub const fn both(&self) -> (&SampleBuffer, &SampleBuffer) {
        (&self.bufs[0], &self.bufs[1])
    }
}

#[test]
fn test_swap_flips_roles_without_copying() {
    let mut pp = PingPong::default();
    pp.buffer_mut(BufferRole::Primary)[0] = 1;
    pp.buffer_mut(BufferRole::Alternate)[0] = 2;
    assert_eq!(pp.active(), BufferRole::Primary);
    pp.swap();
    assert_eq!(pp.active(), BufferRole::Alternate);
    assert_eq!(pp.standby(), BufferRole::Primary);
    assert_eq!(pp.buffer(BufferRole::Primary)[0], 1);
    assert_eq!(pp.buffer(BufferRole::Alternate)[0], 2);
    pp.swap();
    assert_eq!(pp.active(), BufferRole::Primary);
}

//! Pulse-distance infrared remote decoder.
//!
//! ## Wire protocol
//!
//! ```text
//! ▔▔╲_________╱▔▔▔▔▔╲__╱▔▔╲__╱▔▔▔▔▔▔╲__ ... __╱▔▔▔
//!    9 ms      4.5 ms  0 cell  1 cell          stop
//!    leader            1.1 ms  2.25 ms
//! ```
//!
//! Every cell is a 560 µs mark followed by a space; the cell period (mark +
//! space) carries the bit.  32 cells follow the leader: address,
//! address complement, command, command complement.  Only the address
//! (positions 0–7) and command (positions 16–23) are decoded.
//!
//! ## Framing offset
//!
//! After the first frame is stored, both byte windows are read one
//! position later for the lifetime of the decoder: bits 1–7 of each cell,
//! with the least significant bit forced to zero.  Deployed receivers were
//! matched against this behaviour, so it is kept.
//!
//! ## Validation
//!
//! - All-ones address field → [`DecodeError::Checksum`].
//! - A frame that completes while the previous command is unread is still
//!   stored, but reported as [`DecodeError::Overwrite`].

use embedded_hal::digital::PinState;
use log::{debug, info, warn};

use crate::classifier::{Bit, PulseClassifier};
use crate::config::RemoteTiming;
use crate::error::{DecodeError, ProtocolStatus, Result};
use crate::frame::{FrameAssembler, RemoteFrame};
use crate::ports::{EdgeDetect, LineMode, PulseCounter, SignalLine, Ticks};
use crate::timer::EdgeTimer;

use super::latch::EdgeLatch;

const ADDRESS_BIT: usize = 0;
const COMMAND_BIT: usize = 16;

/// Window shift applied after the first stored frame.
const LATE_WINDOW_SKIP: usize = 1;

/// Decoder progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteState {
    Idle,
    StartDetected,
    /// Number of cells collected so far.
    Sampling(u8),
    Validating,
    Done,
    Failed(DecodeError),
}

/// Address and command of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct RemoteCommand {
    pub address: u8,
    pub command: u8,
}

/// Remote-control receiver over an injected line, counter and start latch.
pub struct IrRemote<'a, L, C> {
    line: L,
    timer: EdgeTimer<C>,
    latch: &'a EdgeLatch,
    classifier: PulseClassifier,
    window_skip: usize,
    last: RemoteCommand,
    unread: bool,
    edge_enabled: bool,
    state: RemoteState,
    /// Outcome of the latest attempt; `None` until the first one.
    status: Option<ProtocolStatus>,
}

impl<'a, L, C> IrRemote<'a, L, C>
where
    L: SignalLine + EdgeDetect,
    C: PulseCounter,
{
    pub fn new(line: L, counter: C, latch: &'a EdgeLatch, timing: RemoteTiming) -> Self {
        Self {
            line,
            timer: EdgeTimer::new(counter, timing.full_scale_ticks),
            latch,
            classifier: PulseClassifier::new(timing.one_threshold_ticks),
            window_skip: 0,
            last: RemoteCommand::default(),
            unread: false,
            edge_enabled: false,
            state: RemoteState::Idle,
            status: None,
        }
    }

    /// Sense the line and arm the start-of-frame interrupt.
    pub fn enable(&mut self) -> Result<()> {
        self.line.set_mode(LineMode::Input)?;
        self.line.clear_edge_flag()?;
        self.line.arm_edge_detection()?;
        self.edge_enabled = true;
        info!("remote: receiver enabled");
        Ok(())
    }

    /// Stop reacting to start edges.
    pub fn disable(&mut self) -> Result<()> {
        self.line.disarm_edge_detection()?;
        self.edge_enabled = false;
        info!("remote: receiver disabled");
        Ok(())
    }

    /// Owner-side edge hook: records the start using this decoder's counter.
    ///
    /// Interrupt handlers that cannot reach the decoder call
    /// [`EdgeLatch::record_edge`] directly instead.
    pub fn on_line_edge(&mut self) -> bool {
        let recorded = self.latch.record_edge(self.timer.read_free_running_count());
        if recorded {
            self.state = RemoteState::StartDetected;
        }
        recorded
    }

    /// Acknowledge the hardware edge flag so the next edge can interrupt.
    pub fn clear_pending_edge(&mut self) -> Result<()> {
        self.line.clear_edge_flag()?;
        Ok(())
    }

    /// A start edge has been seen and not yet acquired.
    pub fn command_available(&self) -> bool {
        self.latch.is_pending()
    }

    /// Sample and validate one full frame.
    ///
    /// Blocks for the rest of the frame (tens of milliseconds); each wait is
    /// bounded by the counter's full scale.  Call it from the main loop,
    /// never from the edge interrupt.
    pub fn wait_command_available(&mut self) -> Result<RemoteCommand> {
        let result = self.acquire_frame();
        self.status = Some(ProtocolStatus::from(&result));
        match result {
            Ok(cmd) => {
                self.transition(RemoteState::Done);
                debug!(
                    "remote: address=0x{:02X} command=0x{:02X}",
                    cmd.address, cmd.command
                );
            }
            Err(e) => {
                self.transition(RemoteState::Failed(e));
                warn!("remote: frame rejected: {}", e);
            }
        }
        result
    }

    /// Command byte of the last stored frame; marks it as read.
    pub fn read_command(&mut self) -> u8 {
        self.unread = false;
        self.last.command
    }

    /// Address byte of the last stored frame.
    pub fn read_address(&self) -> u8 {
        self.last.address
    }

    /// A stored command has not been read yet.
    pub fn has_unread(&self) -> bool {
        self.unread
    }

    /// Positions skipped at the start of each byte window (0, then 1).
    pub fn framing_offset(&self) -> usize {
        self.window_skip
    }

    /// Outcome of the latest acquisition, or `None` if none has run.
    pub fn last_status(&self) -> Option<ProtocolStatus> {
        self.status
    }

    pub fn state(&self) -> RemoteState {
        match self.state {
            RemoteState::Idle | RemoteState::Done | RemoteState::Failed(_)
                if self.latch.is_pending() =>
            {
                RemoteState::StartDetected
            }
            s => s,
        }
    }

    /// Hand the line and counter back.
    pub fn release(self) -> (L, C) {
        (self.line, self.timer.into_inner())
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn acquire_frame(&mut self) -> Result<RemoteCommand> {
        let latch = self.latch;
        let _token = latch.try_claim().ok_or(DecodeError::ConcurrentAccess)?;
        if !latch.take_pending() {
            debug!("remote: acquiring without a recorded start edge");
        }

        // Keep the edge interrupt quiet while the frame is timed.
        let rearm = self.edge_enabled;
        if rearm {
            self.line.disarm_edge_detection()?;
        }
        let sampled = self.sample_frame();
        if rearm {
            self.line.clear_edge_flag()?;
            self.line.arm_edge_detection()?;
        }
        let frame = sampled?;

        self.transition(RemoteState::Validating);
        self.store(&frame)
    }

    fn sample_frame(&mut self) -> Result<RemoteFrame> {
        // Idle high (if the leader has not started yet), leader mark, leader space.
        for level in [PinState::High, PinState::Low, PinState::High] {
            self.timer.measure(&mut self.line, level)?;
        }

        FrameAssembler::new().assemble(|n| -> Result<Bit> {
            self.state = RemoteState::Sampling(n as u8);
            let period = self.measure_cell()?;
            Ok(self.classifier.classify(period))
        })
    }

    /// Mark plus space: falling edge to falling edge.
    fn measure_cell(&mut self) -> Result<Ticks> {
        let mark = self.timer.measure(&mut self.line, PinState::Low)?;
        let space = self.timer.measure(&mut self.line, PinState::High)?;
        Ok(mark.saturating_add(space))
    }

    fn store(&mut self, frame: &RemoteFrame) -> Result<RemoteCommand> {
        if frame.byte(ADDRESS_BIT) == 0xFF {
            return Err(DecodeError::Checksum);
        }

        let cmd = RemoteCommand {
            address: frame.window_byte(ADDRESS_BIT, self.window_skip),
            command: frame.window_byte(COMMAND_BIT, self.window_skip),
        };
        let overwritten = self.unread;
        self.last = cmd;
        self.unread = true;
        self.window_skip = LATE_WINDOW_SKIP;

        if overwritten {
            return Err(DecodeError::Overwrite);
        }
        Ok(cmd)
    }

    fn transition(&mut self, next: RemoteState) {
        if self.state != next {
            debug!("remote: {:?} -> {:?}", self.state, next);
        }
        self.state = next;
    }
}

//! Register protocol adapter.
//!
//! Everything that touches the Back End's registers lives here. The backend
//! hands a [`Job`](crate::job::Job) to [`HwProgram::build`], which derives
//! sanitized DMA addresses and enables, and then to [`Engine::program_job`],
//! which writes them in the order the hardware requires.
//!
//! | File | Purpose |
//! |------|---------|
//! | `registers` | Offsets and bitfields |
//! | `bus` | [`RegisterBus`] trait and the volatile [`MmioBus`] |
//! | `program` | Address derivation and enable sanitization |
//! | `engine` | Bring-up, job launch, interrupt status |

pub(crate) mod registers;
mod bus;
mod engine;
mod program;

pub use bus::{MmioBus, RegisterBus};
pub use engine::{BadJobPolicy, BatchStatus, Engine, EngineConfig, ProgramOutcome};
pub use program::HwProgram;

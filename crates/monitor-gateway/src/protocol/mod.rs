//! Gateway protocol definitions
//!
//! Op codes, close codes, intents, the frame envelope, and the codec.

mod close_codes;
mod codec;
mod intents;
mod messages;
mod opcodes;
mod payloads;

pub use close_codes::{close_reason, CloseCode};
pub use codec::{FrameCodec, PRESENCE_UPDATE};
pub use intents::GatewayIntents;
pub use messages::{InboundFrame, OutboundMessage};
pub use opcodes::OpCode;
pub use payloads::{HelloPayload, IdentifyPayload, IdentifyProperties, ReadyPayload, ResumePayload};

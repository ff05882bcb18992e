//! Embedded widget protocol
//!
//! The widget lives on the far side of a trust boundary. The only contact is
//! structured messages in both directions:
//!
//! - **Outbound** ([`Command`] → [`OutboundMessage`]): fire-and-forget
//!   requests such as `playVideo` or `seekTo`. No acknowledgement exists.
//! - **Inbound** ([`InboundEvent`]): state-change pushes, info snapshots,
//!   handshake and error notifications. Every inbound payload is parsed
//!   defensively; anything that does not match returns `None`.
//!
//! # Wire shapes
//!
//! ```text
//! out: {"event":"command","func":"seekTo","args":[42.0,true]}
//! out: {"event":"listening","id":"<session>","channel":"widget"}
//! in:  {"event":"onStateChange","info":1}
//! in:  {"event":"infoDelivery","info":{"currentTime":12.5,"duration":300}}
//! ```

mod inbound;
mod origin;
mod outbound;

pub use inbound::{parse_inbound, parse_inbound_text, InboundEvent, InfoSnapshot, WidgetState};
pub use origin::OriginPolicy;
pub use outbound::{Command, OutboundMessage, LISTENING_CHANNEL};

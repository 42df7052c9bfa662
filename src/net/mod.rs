pub mod arp;
pub mod errors;
pub mod ethernet;
pub mod interface;

// -- Re-export structs for more concise usage

pub use arp::ArpMessage;
pub use errors::HeaderError;
pub use ethernet::{EthernetAddress, EthernetFrame, EthernetHeader};
pub use interface::{NetworkInterface, OutputPort};

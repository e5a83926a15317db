mod media_transport_port;

#[cfg(test)]
pub use media_transport_port::MockMediaTransport;
pub use media_transport_port::MediaTransport;

pub mod extract;
pub mod info;
pub mod media;
pub mod queue;
pub mod rendezvous;
pub mod worker;

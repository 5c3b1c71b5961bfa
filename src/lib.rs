pub mod demo;
pub mod ipoc;
pub mod ndn;
pub mod net;
pub mod sim;
pub mod wire;

#[cfg(test)]
mod test;

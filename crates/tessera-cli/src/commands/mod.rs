pub mod demo;
pub mod init;
pub mod keys;
pub mod light;
pub mod mnemonic;
pub mod resolve;

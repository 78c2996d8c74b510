pub mod coc;
pub mod scenario;

// Purpose - musical data: where notes live (grid), what pitch they take
// (scale, frequency map), and when steps fire (lookahead clock).

pub mod clock;
pub mod grid;
pub mod scale;

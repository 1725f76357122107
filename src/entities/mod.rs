pub mod game;
pub mod game_move;
pub mod player;

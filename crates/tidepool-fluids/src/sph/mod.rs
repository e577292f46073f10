pub mod d2;

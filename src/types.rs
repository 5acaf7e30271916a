/// Number of ranks and files on a Diana chess board.
pub const DIMENSION: usize = 6;

/// Number of cells on the board.
pub const NUM_SQUARES: usize = DIMENSION * DIMENSION;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn from_char(c: char) -> Option<Color> {
        match c {
            'w' => Some(Color::White),
            'b' => Some(Color::Black),
            _ => None,
        }
    }

    pub fn from_case(c: char) -> Color {
        if c.is_uppercase() {
            Color::White
        } else {
            Color::Black
        }
    }

    pub fn other_color(&self) -> Color {
        if *self == Color::White {
            Color::Black
        } else {
            Color::White
        }
    }

    pub fn to_human(&self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
        }
    }

    /// Row delta of a pawn step for this color. White moves up the board (towards row 0).
    pub fn pawn_forward(&self) -> i8 {
        match self {
            Self::White => -1,
            Self::Black => 1,
        }
    }

    /// Row a pawn of this color promotes on
    pub fn promotion_row(&self) -> usize {
        match self {
            Self::White => 0,
            Self::Black => DIMENSION - 1,
        }
    }

    /// Row holding this color's king and rooks in the starting layout
    pub fn back_row(&self) -> usize {
        match self {
            Self::White => DIMENSION - 1,
            Self::Black => 0,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum PieceType {
    Pawn,
    Rook,
    Knight,
    Bishop,
    Queen,
    King,
}

impl PieceType {
    pub fn from_char(c: char) -> Option<PieceType> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceType::Pawn),
            'r' => Some(PieceType::Rook),
            'n' => Some(PieceType::Knight),
            'b' => Some(PieceType::Bishop),
            'q' => Some(PieceType::Queen),
            'k' => Some(PieceType::King),
            _ => None,
        }
    }

    pub fn to_human(&self) -> &'static str {
        match self {
            Self::Pawn => "pawn",
            Self::Rook => "rook",
            Self::Knight => "knight",
            Self::Bishop => "bishop",
            Self::Queen => "queen",
            Self::King => "king",
        }
    }

    pub fn to_char(&self) -> char {
        match self {
            Self::Pawn => 'p',
            Self::Rook => 'R',
            Self::Knight => 'N',
            Self::Bishop => 'B',
            Self::Queen => 'Q',
            Self::King => 'K',
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Piece {
    pub color: Color,
    pub piece_type: PieceType,
}

impl Piece {
    pub const fn new(color: Color, piece_type: PieceType) -> Piece {
        Piece { color, piece_type }
    }

    /// Parse a layout letter, uppercase is white and lowercase is black
    pub fn from_char(c: char) -> Option<Piece> {
        PieceType::from_char(c).map(|piece_type| Piece {
            color: Color::from_case(c),
            piece_type,
        })
    }

    pub fn to_char(&self) -> char {
        let c = self.piece_type.to_char().to_ascii_uppercase();
        match self.color {
            Color::White => c,
            Color::Black => c.to_ascii_lowercase(),
        }
    }

    /// Two character code, color letter then piece letter (`wK`, `bp`)
    pub fn code(&self) -> String {
        let color = match self.color {
            Color::White => 'w',
            Color::Black => 'b',
        };
        format!("{}{}", color, self.piece_type.to_char())
    }

    pub fn to_symbol(&self) -> &'static str {
        let is_white = self.color == Color::White;
        match (self.piece_type, is_white) {
            (PieceType::Pawn, true) => "♙",
            (PieceType::Pawn, false) => "♟︎",
            (PieceType::Rook, true) => "♖",
            (PieceType::Rook, false) => "♜",
            (PieceType::Knight, true) => "♘",
            (PieceType::Knight, false) => "♞",
            (PieceType::Bishop, true) => "♗",
            (PieceType::Bishop, false) => "♝",
            (PieceType::Queen, true) => "♕",
            (PieceType::Queen, false) => "♛",
            (PieceType::King, true) => "♔",
            (PieceType::King, false) => "♚",
        }
    }

    pub fn is(&self, color: Color, piece_type: PieceType) -> bool {
        self.color == color && self.piece_type == piece_type
    }
}

/// A (row, col) step on the board
pub type Direction = (i8, i8);

/// Orthogonal directions first, then diagonals. The analyzer relies on this split.
pub const DIRECTIONS: [Direction; 8] = [
    (-1, 0),
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

pub const ROOK_DIRECTIONS: [Direction; 4] = [(-1, 0), (0, -1), (1, 0), (0, 1)];

pub const BISHOP_DIRECTIONS: [Direction; 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

pub const KNIGHT_OFFSETS: [Direction; 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

pub fn is_diagonal(d: Direction) -> bool {
    d.0 != 0 && d.1 != 0
}

/// Whether two directions lie on the same line (equal or opposite)
pub fn same_axis(a: Direction, b: Direction) -> bool {
    a == b || a == (-b.0, -b.1)
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct Square {
    pub row: u8, // 0 is black's back rank
    pub col: u8, // 0 is file a
}

impl Square {
    pub const fn new(row: u8, col: u8) -> Square {
        Square { row, col }
    }

    pub fn index(&self) -> usize {
        self.row as usize * DIMENSION + self.col as usize
    }

    pub fn from_index(index: usize) -> Square {
        Square {
            row: (index / DIMENSION) as u8,
            col: (index % DIMENSION) as u8,
        }
    }

    /// Step `distance` times in direction `d`, `None` when it leaves the board
    pub fn offset(&self, d: Direction, distance: i8) -> Option<Square> {
        let row = self.row as i8 + d.0 * distance;
        let col = self.col as i8 + d.1 * distance;
        if (0..DIMENSION as i8).contains(&row) && (0..DIMENSION as i8).contains(&col) {
            Some(Square::new(row as u8, col as u8))
        } else {
            None
        }
    }

    pub fn file_char(&self) -> char {
        (b'a' + self.col) as char
    }

    pub fn rank_char(&self) -> char {
        (b'0' + DIMENSION as u8 - self.row) as char
    }

    pub fn to_algebraic(&self) -> String {
        format!("{}{}", self.file_char(), self.rank_char())
    }

    pub fn from_algebraic(s: &str) -> Option<Square> {
        let mut chars = s.chars();
        let file = chars.next()?;
        let rank = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        let col = (file as u32).checked_sub('a' as u32)?;
        let rank = rank.to_digit(10)?;
        if col as usize >= DIMENSION || rank == 0 || rank as usize > DIMENSION {
            return None;
        }
        Some(Square::new((DIMENSION as u32 - rank) as u8, col as u8))
    }
}

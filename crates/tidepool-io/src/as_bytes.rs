use glam::Vec2;

/// Fixed-size native-endian byte representation.
pub trait AsBytes<const N: usize> {
    fn from_bytes(b: [u8; N]) -> Self;

    fn to_bytes(self) -> [u8; N];
}

impl AsBytes<1> for u8 {
    fn from_bytes(b: [u8; 1]) -> Self {
        b[0]
    }

    fn to_bytes(self) -> [u8; 1] {
        [self]
    }
}

impl AsBytes<4> for u32 {
    fn from_bytes(b: [u8; 4]) -> Self {
        u32::from_ne_bytes(b)
    }

    fn to_bytes(self) -> [u8; 4] {
        self.to_ne_bytes()
    }
}

impl AsBytes<8> for u64 {
    fn from_bytes(b: [u8; 8]) -> Self {
        u64::from_ne_bytes(b)
    }

    fn to_bytes(self) -> [u8; 8] {
        self.to_ne_bytes()
    }
}

impl AsBytes<4> for f32 {
    fn from_bytes(b: [u8; 4]) -> Self {
        f32::from_ne_bytes(b)
    }

    fn to_bytes(self) -> [u8; 4] {
        self.to_ne_bytes()
    }
}

impl AsBytes<8> for Vec2 {
    fn from_bytes(b: [u8; 8]) -> Self {
        let [x0, x1, x2, x3, y0, y1, y2, y3] = b;

        Vec2::new(
            f32::from_bytes([x0, x1, x2, x3]),
            f32::from_bytes([y0, y1, y2, y3]),
        )
    }

    fn to_bytes(self) -> [u8; 8] {
        let [x0, x1, x2, x3] = self.x.to_bytes();
        let [y0, y1, y2, y3] = self.y.to_bytes();

        [x0, x1, x2, x3, y0, y1, y2, y3]
    }
}

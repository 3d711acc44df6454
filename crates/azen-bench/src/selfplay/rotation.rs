/// Cyclic seat assignments: in rotation `r`, seat `s` is taken by agent `(s + r) % n`.
pub struct SeatRotation {
    seats: usize,
}

impl SeatRotation {
    pub fn new(seats: usize) -> Self {
        Self { seats }
    }

    pub fn len(&self) -> usize {
        self.seats
    }

    pub fn is_empty(&self) -> bool {
        self.seats == 0
    }

    /// Agent index per seat for the given game.
    pub fn for_game(&self, game_index: usize) -> Vec<usize> {
        if self.seats == 0 {
            return Vec::new();
        }
        let shift = game_index % self.seats;
        (0..self.seats)
            .map(|seat| (seat + shift) % self.seats)
            .collect()
    }
}

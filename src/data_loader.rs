pub trait DataLoader {
    type Batcher;

    /// Starts a new pass over the data.
    fn batcher(&self) -> Self::Batcher;
}

/// What a worker went through during a single pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepStats {
    pub rows: usize,
    pub squared_error: f64,
}

impl StepStats {
    pub fn new(rows: usize, squared_error: f64) -> Self {
        Self {
            rows,
            squared_error,
        }
    }
}

/// The logistic function scaled by an amplitude.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sigmoid {
    amp: f64,
}

impl Default for Sigmoid {
    fn default() -> Self {
        Self { amp: 1. }
    }
}

impl Sigmoid {
    pub fn new(amp: f64) -> Self {
        Self { amp }
    }

    pub fn amp(&self) -> f64 {
        self.amp
    }

    pub fn f(&self, z: f64) -> f64 {
        self.amp / (1. + (-z).exp())
    }

    /// The derivative expressed in terms of the activation's output `a`.
    pub fn df(&self, a: f64) -> f64 {
        a * (self.amp - a) / self.amp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn df_matches_the_analytic_derivative() {
        let sigmoid = Sigmoid::new(2.);

        for z in [-3.0_f64, -0.5, 0., 0.7, 4.] {
            let expected = 2. * (-z).exp() / (1. + (-z).exp()).powi(2);
            let got = sigmoid.df(sigmoid.f(z));
            assert!((got - expected).abs() < 1e-12, "z = {z}: {got} != {expected}");
        }
    }
}

// src/algorithms/sampler.rs

use crate::core::{ExplainError, Perturbation, PerturbationPopulation, Result, Text};
use rand::Rng;
use rand_distr::{Bernoulli, Distribution};

/// Draws `count` random token-dropout variants of `text`.
///
/// Each token of each variant is kept independently with probability
/// `1 - removal_rate`. Masks are not deduplicated, and a mask may drop every
/// token, in which case the variant text is empty.
pub fn sample<R: Rng + ?Sized>(
    text: &Text,
    count: usize,
    removal_rate: f64,
    rng: &mut R,
) -> Result<PerturbationPopulation> {
    if text.is_empty() {
        return Err(ExplainError::EmptyInput);
    }
    if count == 0 {
        return Err(ExplainError::InvalidConfig(
            "perturbation count must be at least 1".to_string(),
        ));
    }
    let keep = Bernoulli::new(1.0 - removal_rate).map_err(|_| {
        ExplainError::InvalidConfig(format!(
            "removal_rate must lie in [0, 1], got {}",
            removal_rate
        ))
    })?;

    let width = text.len();
    let perturbations: Vec<Perturbation> = (0..count)
        .map(|_| {
            let mask: Vec<bool> = (0..width).map(|_| keep.sample(&mut *rng)).collect();
            let variant = text.masked(&mask);
            Perturbation { mask, text: variant }
        })
        .collect();

    log::debug!(
        "sampled {} perturbations over {} tokens ({} blank)",
        perturbations.len(),
        width,
        perturbations.iter().filter(|p| p.is_blank()).count()
    );

    Ok(PerturbationPopulation {
        original: text.clone(),
        perturbations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn masks_have_one_bit_per_token() -> Result<()> {
        let text = Text::new("the food was terrible")?;
        let population = sample(&text, 30, 0.5, &mut StdRng::seed_from_u64(7))?;
        assert_eq!(population.len(), 30);
        for p in &population.perturbations {
            assert_eq!(p.mask.len(), 4);
            assert_eq!(p.text, text.masked(&p.mask));
        }
        Ok(())
    }

    #[test]
    fn same_seed_same_population() -> Result<()> {
        let text = Text::new("a quick brown fox jumps")?;
        let a = sample(&text, 20, 0.5, &mut StdRng::seed_from_u64(42))?;
        let b = sample(&text, 20, 0.5, &mut StdRng::seed_from_u64(42))?;
        assert_eq!(a.perturbations, b.perturbations);
        Ok(())
    }

    #[test]
    fn extreme_rates_are_deterministic() -> Result<()> {
        let text = Text::new("keep every word")?;
        let mut rng = StdRng::seed_from_u64(1);
        let kept = sample(&text, 5, 0.0, &mut rng)?;
        assert!(kept.perturbations.iter().all(|p| p.text == "keep every word"));
        let dropped = sample(&text, 5, 1.0, &mut rng)?;
        assert!(dropped.perturbations.iter().all(|p| p.is_blank() && p.text.is_empty()));
        Ok(())
    }

    #[test]
    fn invalid_arguments_fail_before_sampling() -> Result<()> {
        let text = Text::new("fine")?;
        let mut rng = StdRng::seed_from_u64(3);
        assert!(matches!(sample(&text, 0, 0.5, &mut rng), Err(ExplainError::InvalidConfig(_))));
        assert!(matches!(sample(&text, 3, -0.1, &mut rng), Err(ExplainError::InvalidConfig(_))));
        Ok(())
    }
}

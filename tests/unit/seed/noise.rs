use super::*;

#[test]
fn perlin_is_deterministic_per_seed() {
    let a = PerlinNoise::new(SignatureSeed(1234));
    let b = PerlinNoise::new(SignatureSeed(1234));
    for i in 0..50 {
        let x = f64::from(i) * 0.09;
        let z = 12.34 + 3000.0;
        assert_eq!(a.noise(x, x + 1.0, z).to_bits(), b.noise(x, x + 1.0, z).to_bits());
    }
}

#[test]
fn perlin_differs_across_seeds() {
    let a = PerlinNoise::new(SignatureSeed(1));
    let b = PerlinNoise::new(SignatureSeed(2));
    let differs = (0..20).any(|i| {
        let x = f64::from(i) * 0.37;
        a.noise(x, 0.5, 0.25) != b.noise(x, 0.5, 0.25)
    });
    assert!(differs);
}

#[test]
fn perlin_stays_in_unit_interval() {
    let n = PerlinNoise::new(SignatureSeed(987_654_321));
    for i in 0..100 {
        for j in 0..20 {
            let v = n.noise(
                f64::from(i) * 0.09 + 1000.0,
                f64::from(j) * 0.09 + 1000.0,
                9_876_543.21 + 1000.0,
            );
            assert!((0.0..=1.0).contains(&v), "{v}");
        }
    }
}

#[test]
fn perlin_is_smooth_between_neighbours() {
    let n = PerlinNoise::new(SignatureSeed(55));
    let a = n.noise(3.0, 4.0, 5.0);
    let b = n.noise(3.001, 4.0, 5.0);
    assert!((a - b).abs() < 0.01);
}

#[test]
fn perlin_mirrors_negative_coordinates() {
    let n = PerlinNoise::new(SignatureSeed(77));
    assert_eq!(n.noise(-1.25, 2.5, -0.75), n.noise(1.25, 2.5, 0.75));
}

#[test]
fn hash_noise_formula_and_range() {
    let n = HashNoise;
    let v = n.noise(0.0, 0.0, 0.0);
    assert!((v - 0.5).abs() < 1e-12);
    for i in 0..200 {
        let x = f64::from(i) * 0.09;
        let v = n.noise(x, x * 2.0, 4242.0);
        assert!((0.0..=1.0).contains(&v));
    }
}

#[test]
fn fidelity_selects_generator_pair() {
    let seed = SignatureSeed(10);
    assert!(matches!(NoiseFidelity::Coherent.random(seed), SeededRandom::Lcg(_)));
    assert!(matches!(NoiseFidelity::Coherent.noise(seed), SeededNoise::Perlin(_)));
    assert!(matches!(NoiseFidelity::Fast.random(seed), SeededRandom::Sine(_)));
    assert!(matches!(NoiseFidelity::Fast.noise(seed), SeededNoise::Hash(_)));
    assert_eq!(NoiseFidelity::default(), NoiseFidelity::Coherent);
}

#[test]
fn fidelity_parses_from_str() {
    assert_eq!("coherent".parse::<NoiseFidelity>().unwrap(), NoiseFidelity::Coherent);
    assert_eq!(" FAST ".parse::<NoiseFidelity>().unwrap(), NoiseFidelity::Fast);
    assert!("smooth".parse::<NoiseFidelity>().is_err());
}

//! Tests fuzz safe : robustesse + déterminisme + limites contrôlées.
//!
//! But : marteler l'arithmétique en virgule fixe et les points d'entrée sans brûler la machine.
//! - RNG déterministe (seed fixe)
//! - tailles bornées (numérateurs, dénominateurs, précisions)
//! - budget temps global
//! - oracle exact : BigRational
//! - on accepte les erreurs attendues (x hors table, |x| ≥ 1), rien d'autre

use std::time::{Duration, Instant};

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use super::coefficients::{PointSupporte, TOLERANCE_X};
use super::erreur::Erreur;
use super::reel::Reel;
use super::serie::{estimate_terms_needed, evaluate_series};

/* ------------------------ RNG déterministe minimal ------------------------ */

#[derive(Clone)]
struct Rng {
    state: u64,
}
impl Rng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }
    fn next_u32(&mut self) -> u32 {
        // LCG simple (déterministe)
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u32
    }
    fn pick(&mut self, n: u32) -> u32 {
        if n == 0 {
            0
        } else {
            self.next_u32() % n
        }
    }
    fn coin(&mut self) -> bool {
        (self.next_u32() & 1) == 1
    }
    /// uniforme dans [−1, 1]
    fn unit(&mut self) -> f64 {
        self.next_u32() as f64 / u32::MAX as f64 * 2.0 - 1.0
    }
}

/* ------------------------ Budget anti-gel ------------------------ */

fn budget(start: Instant, max: Duration) {
    if start.elapsed() > max {
        panic!("budget temps dépassé: {:?}", max);
    }
}

/* ------------------------ Helpers fuzz ------------------------ */

fn is_erreur_attendue(e: &Erreur) -> bool {
    matches!(
        e,
        Erreur::ValeurXNonSupportee { .. } | Erreur::EntreeDivergente { .. }
    )
}

/// Rationnel borné : numérateur dans [−50, 50], dénominateur dans [1, 9].
fn gen_rat(rng: &mut Rng) -> BigRational {
    let n = rng.pick(101) as i64 - 50;
    let d = rng.pick(9) as i64 + 1;
    BigRational::new(BigInt::from(n), BigInt::from(d))
}

fn gen_bits(rng: &mut Rng) -> u32 {
    64 + 32 * rng.pick(8)
}

/// |reel − exact| ≤ 2^-(bits − marge)
fn assert_proche(reel: &Reel, exact: &BigRational, marge: u32, ctx: &str) {
    let tol = BigRational::new(BigInt::one(), BigInt::one() << (reel.bits() - marge));
    let e = (reel.en_rationnel() - exact).abs();
    assert!(e <= tol, "{ctx}: reel={reel} exact={exact}");
}

/* ------------------------ Tests ------------------------ */

#[test]
fn fuzz_safe_arithmetique_contre_rationnels() {
    let t0 = Instant::now();
    let max = Duration::from_millis(500);
    let mut rng = Rng::new(0xC0FFEE_u64);

    for _ in 0..400 {
        budget(t0, max);

        let bits = gen_bits(&mut rng);
        let (qa, qb) = (gen_rat(&mut rng), gen_rat(&mut rng));
        let (a, b) = (
            Reel::depuis_rationnel(&qa, bits),
            Reel::depuis_rationnel(&qb, bits),
        );

        assert_proche(&(&a + &b), &(&qa + &qb), 2, "add");
        assert_proche(&(&a - &b), &(&qa - &qb), 2, "sub");
        assert_proche(&(&a * &b), &(&qa * &qb), 8, "mul");
        assert_proche(&(-&a), &(-&qa), 1, "neg");
        assert_proche(&a.carre(), &(&qa * &qa), 8, "carre");

        match a.divise(&b) {
            Some(q) => assert_proche(&q, &(&qa / &qb), 16, "div"),
            None => assert!(qb.is_zero(), "division refusée pour b={qb}"),
        }

        // l'ordre suit l'ordre exact (hors égalité à la troncature près)
        if qa != qb {
            assert_eq!(a.compare(&b), qa.cmp(&qb), "compare {qa} {qb}");
        }
    }
}

#[test]
fn fuzz_safe_texte_aller_retour() {
    let t0 = Instant::now();
    let max = Duration::from_millis(300);
    let mut rng = Rng::new(0xBADC0DE_u64);

    for _ in 0..150 {
        budget(t0, max);

        let bits = gen_bits(&mut rng);
        let x = Reel::depuis_rationnel(&gen_rat(&mut rng), bits);
        let texte = x.en_decimal(x.chiffres_exacts());
        let relu = Reel::lire_decimal(&texte, bits).unwrap_or_else(|e| panic!("{texte}: {e}"));
        assert_eq!(relu, x, "texte={texte}");

        let j = serde_json::to_string(&x).unwrap();
        let y: Reel = serde_json::from_str(&j).unwrap();
        assert_eq!(y, x);
    }
}

#[test]
fn fuzz_safe_arrondi_entier() {
    let mut rng = Rng::new(0x5EED_u64);
    for _ in 0..200 {
        let q = gen_rat(&mut rng);
        let r = Reel::depuis_rationnel(&q, 96);
        let n = r.arrondi_entier();
        // |q − n| ≤ 1/2 (+ une unité de grille)
        let ecart = (&q - BigRational::from_integer(n)).abs();
        let demi = BigRational::new(BigInt::from(1), BigInt::from(2));
        let grille = BigRational::new(BigInt::one(), BigInt::one() << 90);
        assert!(ecart <= demi + grille, "q={q} n={}", r.arrondi_entier());
    }
}

#[test]
fn fuzz_safe_points_et_series() {
    let t0 = Instant::now();
    let max = Duration::from_secs(5);
    let mut rng = Rng::new(0xFACADE_u64);

    let mut seen_ok = 0usize;
    let mut seen_err = 0usize;

    for _ in 0..60 {
        budget(t0, max);

        // x proche d'un point supporté, ou n'importe où dans [−1.5, 1.5]
        let x = if rng.coin() {
            let p = PointSupporte::TOUS[rng.pick(3) as usize];
            p.valeur() + rng.unit() * 2.0 * TOLERANCE_X
        } else {
            rng.unit() * 1.5
        };

        match PointSupporte::depuis_x(x) {
            Ok(p) => assert!((p.valeur() - x).abs() < TOLERANCE_X),
            Err(e) => assert!(is_erreur_attendue(&e), "x={x} err={e}"),
        }

        match evaluate_series(x, Some(12)) {
            Ok(s) => {
                assert!(x.abs() < 1.0);
                assert!(s.converge, "x={x}");
                // l'estimation grossière reste du bon ordre loin du bord
                let n = estimate_terms_needed(x, 12).unwrap();
                if x.abs() <= 0.75 {
                    assert!(s.termes <= n * 4, "x={x} termes={} estimé={n}", s.termes);
                }
                seen_ok += 1;
            }
            Err(e) => {
                assert!(is_erreur_attendue(&e), "x={x} err={e}");
                assert!(x.abs() >= 1.0);
                seen_err += 1;
            }
        }
    }

    assert!(seen_ok > 10, "trop peu de succès: {seen_ok}");
    assert!(seen_err > 0, "aucune erreur vue: fuzz trop “sage”");
}

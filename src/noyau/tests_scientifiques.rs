//! Tests scientifiques (campagne) : propriétés de S(x) + robustesse + limites contrôlées.
//!
//! But : vérifier les contrats numériques sans faire chauffer la machine.
//! - budget temps global par test
//! - précisions bornées (≤ 300 chiffres)
//!
//! Notes importantes (alignées avec les tables embarquées) :
//! - Les tables de coefficients sont certifiées à 10^-96, pas exactes : le résidu
//!   |S − Σ c_i ω_i| plafonne vers 10^-98 (x = 1/2, 1/4) et 10^-99 (x = −1/2).
//!   Au-delà de ~95 chiffres, l'accord série / forme close est donc borné par 10^-96.
//! - La décroissance stricte du résidu se teste sous ce plancher ({30, 45, 60, 75}) ;
//!   au-dessus ({100, …, 300}) l'analyse doit constater un plateau.

use std::time::{Duration, Instant};

use num_bigint::BigInt;
use num_rational::BigRational;

use super::base::{compute_basis, TAILLE_BASE};
use super::coefficients::{get_coefficients, AVAILABLE_X_VALUES};
use super::erreur::Erreur;
use super::forme_close::{compare_with_series, evaluate_closed_form};
use super::precision::{precision_ambiante, PortePrecision, Precision, PRECISION_DEFAUT};
use super::reel::Reel;
use super::serie::evaluate_series;
use super::verification::{analyze_stability, verify_identity, Verdict};

/// Budget global anti-gel.
fn budget(start: Instant, max: Duration) {
    if start.elapsed() > max {
        panic!("budget temps dépassé: {:?}", max);
    }
}

fn xs() -> impl Iterator<Item = f64> {
    AVAILABLE_X_VALUES.iter().map(|(_, x)| *x)
}

fn ecart(a: &Reel, b: &Reel) -> Reel {
    (a - b).abs()
}

/// |a − b| < 10^-k
fn proches(a: &Reel, b: &Reel, k: u32) -> bool {
    ecart(a, b).abs_inferieur(&Reel::puissance_dix_negative(k, a.bits()))
}

/* ------------------------ Accord série / forme close ------------------------ */

#[test]
fn sci_accord_serie_forme_close() {
    let t0 = Instant::now();
    let max = Duration::from_secs(60);

    for x in xs() {
        for p in [50u32, 80] {
            let s = evaluate_series(x, Some(p)).unwrap();
            assert!(s.converge, "x={x} P={p}");
            let f = evaluate_closed_form(x, Some(p)).unwrap();
            assert!(
                proches(&s.valeur, &f, p - 15),
                "x={x} P={p} écart={}",
                ecart(&s.valeur, &f).en_scientifique(3)
            );
            budget(t0, max);
        }

        // au-delà du plancher des tables : 10^-96
        let s = evaluate_series(x, Some(120)).unwrap();
        let f = evaluate_closed_form(x, Some(120)).unwrap();
        assert!(proches(&s.valeur, &f, 96), "x={x} P=120");
        budget(t0, max);
    }
}

#[test]
fn sci_scenario_demi_cinquante() {
    let cmp = compare_with_series(0.5, Some(50)).unwrap();
    assert!(cmp.converge);
    assert_eq!(cmp.termes_serie, 199);
    // au moins 35 chiffres significatifs communs
    let rel = cmp.ecart_relatif.unwrap();
    assert!(rel.abs_inferieur(&Reel::puissance_dix_negative(35, rel.bits())));
}

/* ------------------------ Dimensions ------------------------ */

#[test]
fn sci_longueurs_base_et_coefficients() {
    for p in [10u32, 25, 60] {
        assert_eq!(compute_basis(Some(p)).unwrap().len(), TAILLE_BASE);
    }
    for x in xs() {
        assert_eq!(get_coefficients(x).unwrap().len(), TAILLE_BASE);
    }
}

#[test]
fn sci_coefficients_exacts() {
    let q = |n: i64, d: i64| BigRational::new(BigInt::from(n), BigInt::from(d));
    assert_eq!(get_coefficients(0.5).unwrap().valeurs()[0], q(15683, 14280));
    assert_eq!(get_coefficients(-0.5).unwrap().valeurs()[0], q(2879, 58060));
    // reconnaissance à 1e-10 près
    assert!(get_coefficients(0.5 + 5e-11).is_ok());
    assert!(matches!(
        get_coefficients(0.5 + 1e-9),
        Err(Erreur::ValeurXNonSupportee { .. })
    ));
}

/* ------------------------ Stabilité en précision ------------------------ */

#[test]
fn sci_chiffres_stables_en_montant() {
    // P₁ → P₂ > P₁ : les (P₁ − 5) premiers chiffres significatifs ne bougent pas
    let (p1, p2) = (30u32, 60u32);
    for x in xs() {
        let s1 = evaluate_series(x, Some(p1)).unwrap().valeur;
        let s2 = evaluate_series(x, Some(p2)).unwrap().valeur;
        let f1 = evaluate_closed_form(x, Some(p1)).unwrap();
        let f2 = evaluate_closed_form(x, Some(p2)).unwrap();

        for (a, b) in [(&s1, &s2), (&f1, &f2)] {
            let a = a.a_bits(b.bits());
            let rel = ecart(&a, b).divise(&b.abs()).unwrap();
            assert!(
                rel.abs_inferieur(&Reel::puissance_dix_negative(p1 - 5, b.bits())),
                "x={x} écart relatif={}",
                rel.en_scientifique(3)
            );
        }
    }
}

#[test]
fn sci_residu_decroit_sous_le_plancher() {
    let a = analyze_stability(0.5, &[30, 45, 60, 75]).unwrap();
    assert!(a.decroissance_stricte, "{:?}", a.points);
    assert!(a.exacte);
    assert!(a.pente.unwrap() < -0.5);
}

#[test]
fn sci_residu_plafonne_au_dessus() {
    let t0 = Instant::now();
    let a = analyze_stability(0.5, &[100, 150, 200, 250, 300]).unwrap();
    budget(t0, Duration::from_secs(120));
    assert!(!a.exacte);
    assert!(a.pente.unwrap().abs() < 0.1, "pente = {:?}", a.pente);
    for p in &a.points {
        // ≈ 2.72e-98
        let l = p.log10_residu.unwrap();
        assert!((l + 97.57).abs() < 0.2, "P={} log10={l}", p.chiffres);
        assert_eq!(p.verdict, Verdict::Acceptee);
    }
}

#[test]
fn sci_identite_certifiee_a_deux_cents() {
    let r = verify_identity(0.5, Some(200), 1e-96).unwrap();
    assert!(r.acceptee(), "verdict = {:?}", r.verdict);
    assert_eq!(r.termes_serie, 688);
    assert!(r.log10_residu().unwrap() < -96.0);
}

/* ------------------------ Terminaison de la série ------------------------ */

#[test]
fn sci_serie_termine_dans_le_disque() {
    let t0 = Instant::now();
    let max = Duration::from_secs(20);
    for x in [0.9, -0.9, 0.75, 1e-3, 0.0] {
        let s = evaluate_series(x, Some(20)).unwrap();
        assert!(s.converge, "x={x}");
        budget(t0, max);
    }
    for x in [1.0, -1.0, 1.5, f64::INFINITY, f64::NAN] {
        assert!(
            matches!(
                evaluate_series(x, Some(20)),
                Err(Erreur::EntreeDivergente { .. })
            ),
            "x={x}"
        );
    }
}

/* ------------------------ Précision ambiante : pas de fuite ------------------------ */

#[test]
fn sci_precision_ambiante_sans_fuite() {
    assert_eq!(precision_ambiante(), PRECISION_DEFAUT);

    {
        let _porte = PortePrecision::ouvrir(Precision::new(33).unwrap());
        assert_eq!(precision_ambiante(), 33);

        let _ = evaluate_series(0.25, Some(40)).unwrap();
        assert_eq!(precision_ambiante(), 33);

        // chemins d'erreur
        assert!(evaluate_closed_form(0.3, Some(40)).is_err());
        assert!(evaluate_series(2.0, Some(40)).is_err());
        assert!(verify_identity(0.5, Some(20), -1.0).is_err());
        assert!(compute_basis(Some(3)).is_err());
        assert_eq!(precision_ambiante(), 33);

        // imbrication : la précision ambiante sert de défaut
        let b = compute_basis(None).unwrap();
        assert_eq!(b.precision().chiffres(), 33);
        assert_eq!(precision_ambiante(), 33);
    }

    assert_eq!(precision_ambiante(), PRECISION_DEFAUT);
}

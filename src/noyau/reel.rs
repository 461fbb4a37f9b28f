// src/noyau/reel.rs
//
// Réel haute précision en virgule fixe binaire.
//
// Valeur = m · 2^-bits, m entier signé (BigInt).
// - addition / soustraction : exactes (après alignement sur les bits de gauche)
// - multiplication : (a·b) >> bits, erreur ≤ 1 ulp
// - division : (a << bits) / b, troncature
// - écriture décimale tronquée (jamais arrondie vers le haut) + relecture arrondie

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::erreur::{Erreur, Resultat};
use super::precision::GARDE_DECIMALE;

const LOG10_2: f64 = std::f64::consts::LOG10_2;

/* ------------------------ Helpers entiers ------------------------ */

pub(crate) fn pow10(n: u32) -> BigInt {
    BigInt::from(10).pow(n)
}

/// round(n / d) pour n ≥ 0, d > 0.
pub(crate) fn div_arrondie(n: &BigInt, d: &BigInt) -> BigInt {
    (n * 2 + d) / (d * 2)
}

/* ------------------------ Type ------------------------ */

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reel {
    m: BigInt,
    bits: u32,
}

impl Reel {
    pub fn zero(bits: u32) -> Self {
        Self {
            m: BigInt::zero(),
            bits,
        }
    }

    pub fn un(bits: u32) -> Self {
        Self {
            m: BigInt::one() << bits,
            bits,
        }
    }

    pub(crate) fn depuis_mantisse(m: BigInt, bits: u32) -> Self {
        Self { m, bits }
    }

    pub fn depuis_entier(n: impl Into<BigInt>, bits: u32) -> Self {
        Self {
            m: n.into() << bits,
            bits,
        }
    }

    /// num/den tronqué ; den ≠ 0.
    pub fn depuis_ratio(num: impl Into<BigInt>, den: impl Into<BigInt>, bits: u32) -> Self {
        let num: BigInt = num.into();
        let den: BigInt = den.into();
        Self {
            m: (num << bits) / den,
            bits,
        }
    }

    pub fn depuis_rationnel(r: &BigRational, bits: u32) -> Self {
        Self {
            m: (r.numer() << bits) / r.denom(),
            bits,
        }
    }

    /// Conversion exacte d'un f64 fini (None pour NaN / ±∞).
    pub fn depuis_f64(v: f64, bits: u32) -> Option<Self> {
        BigRational::from_float(v).map(|r| Self::depuis_rationnel(&r, bits))
    }

    /// 10^-e tronqué.
    pub fn puissance_dix_negative(e: u32, bits: u32) -> Self {
        Self {
            m: (BigInt::one() << bits) / pow10(e),
            bits,
        }
    }

    pub fn mantisse(&self) -> &BigInt {
        &self.m
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn est_nul(&self) -> bool {
        self.m.is_zero()
    }

    pub fn est_negatif(&self) -> bool {
        self.m.is_negative()
    }

    pub fn abs(&self) -> Reel {
        Self {
            m: self.m.abs(),
            bits: self.bits,
        }
    }

    fn mantisse_alignee(&self, bits: u32) -> Cow<'_, BigInt> {
        match self.bits.cmp(&bits) {
            Ordering::Equal => Cow::Borrowed(&self.m),
            Ordering::Less => Cow::Owned(&self.m << (bits - self.bits)),
            Ordering::Greater => Cow::Owned(&self.m >> (self.bits - bits)),
        }
    }

    /// Même valeur sur une autre grille (troncature si on réduit).
    pub fn a_bits(&self, bits: u32) -> Reel {
        Self {
            m: self.mantisse_alignee(bits).into_owned(),
            bits,
        }
    }

    /// Valeur exacte m / 2^bits.
    pub fn en_rationnel(&self) -> BigRational {
        BigRational::new(self.m.clone(), BigInt::one() << self.bits)
    }

    /* ------------------------ Arithmétique ------------------------ */

    pub fn carre(&self) -> Reel {
        Self {
            m: (&self.m * &self.m) >> self.bits,
            bits: self.bits,
        }
    }

    /// None si le diviseur est nul.
    pub fn divise(&self, autre: &Reel) -> Option<Reel> {
        let d = autre.mantisse_alignee(self.bits);
        if d.is_zero() {
            return None;
        }
        Some(Self {
            m: (&self.m << self.bits) / &*d,
            bits: self.bits,
        })
    }

    pub fn mul_entier(&self, k: &BigInt) -> Reel {
        Self {
            m: &self.m * k,
            bits: self.bits,
        }
    }

    /// Division par un entier non nul (troncature).
    pub fn div_entier(&self, k: &BigInt) -> Reel {
        Self {
            m: &self.m / k,
            bits: self.bits,
        }
    }

    pub fn mul_rationnel(&self, r: &BigRational) -> Reel {
        Self {
            m: (&self.m * r.numer()) / r.denom(),
            bits: self.bits,
        }
    }

    pub fn puissance(&self, n: u32) -> Reel {
        let mut resultat = Reel::un(self.bits);
        let mut base = self.clone();
        let mut e = n;
        while e > 0 {
            if e & 1 == 1 {
                resultat = &resultat * &base;
            }
            e >>= 1;
            if e > 0 {
                base = base.carre();
            }
        }
        resultat
    }

    /// √x tronquée ; None si x < 0.
    pub fn racine(&self) -> Option<Reel> {
        if self.m.is_negative() {
            return None;
        }
        Some(Self {
            m: (&self.m << self.bits).sqrt(),
            bits: self.bits,
        })
    }

    /// Entier le plus proche (demi arrondi loin de zéro).
    pub fn arrondi_entier(&self) -> BigInt {
        if self.bits == 0 {
            return self.m.clone();
        }
        let demi = BigInt::one() << (self.bits - 1);
        let r = (self.m.abs() + demi) >> self.bits;
        if self.m.is_negative() {
            -r
        } else {
            r
        }
    }

    /* ------------------------ Comparaisons ------------------------ */

    pub fn compare(&self, autre: &Reel) -> Ordering {
        self.m.cmp(&autre.mantisse_alignee(self.bits))
    }

    /// |self| < borne (borne ≥ 0).
    pub fn abs_inferieur(&self, borne: &Reel) -> bool {
        self.m.abs() < *borne.mantisse_alignee(self.bits)
    }

    /* ------------------------ Lecture flottante ------------------------ */

    // tête sur 64 bits + exposant binaire
    fn tete_exposant(&self) -> (f64, i64) {
        let nb = self.m.bits();
        let decalage = nb.saturating_sub(64);
        let tete = (&self.m >> decalage).to_f64().unwrap_or(0.0);
        (tete, decalage as i64 - self.bits as i64)
    }

    pub fn to_f64(&self) -> f64 {
        if self.m.is_zero() {
            return 0.0;
        }
        let (tete, e) = self.tete_exposant();
        let e = e.clamp(-4000, 4000) as i32;
        // en deux temps : 2^e seul peut sortir des normaux
        tete * 2f64.powi(e / 2) * 2f64.powi(e - e / 2)
    }

    /// log10 |x| (−∞ pour 0).
    pub fn log10_abs(&self) -> f64 {
        if self.m.is_zero() {
            return f64::NEG_INFINITY;
        }
        let (tete, e) = self.tete_exposant();
        tete.abs().log10() + e as f64 * LOG10_2
    }

    /* ------------------------ Décimal ------------------------ */

    /// Chiffres qui correspondent à la précision demandée (garde retirée).
    pub fn chiffres_nominaux(&self) -> u32 {
        ((self.bits as f64 * LOG10_2).floor() as u32)
            .saturating_sub(GARDE_DECIMALE)
            .max(1)
    }

    /// Chiffres suffisants pour relire exactement la mantisse.
    pub fn chiffres_exacts(&self) -> usize {
        ((self.bits as f64 + 1.0) * LOG10_2).ceil() as usize + 1
    }

    /// Texte décimal tronqué à `chiffres` décimales.
    pub fn en_decimal(&self, chiffres: usize) -> String {
        let neg = self.m.is_negative();
        let echelle = pow10(chiffres as u32);
        let scaled = (self.m.abs() * &echelle) >> self.bits;

        let int_part = &scaled / &echelle;
        let signe = if neg && !scaled.is_zero() { "-" } else { "" };

        if chiffres == 0 {
            return format!("{signe}{int_part}");
        }

        let mut frac = (&scaled % &echelle).to_str_radix(10);
        while frac.len() < chiffres {
            frac.insert(0, '0');
        }
        format!("{signe}{int_part}.{frac}")
    }

    /// Notation scientifique tronquée, `sig` chiffres significatifs (ex. "2.720e-98").
    pub fn en_scientifique(&self, sig: usize) -> String {
        if self.m.is_zero() {
            return "0".to_string();
        }
        let sig = sig.max(1) as i64;
        let a = self.m.abs();
        let chiffres_de = |e: i64| -> BigInt {
            let k = sig - 1 - e;
            if k >= 0 {
                (&a * pow10(k as u32)) >> self.bits
            } else {
                (&a >> self.bits) / pow10((-k) as u32)
            }
        };

        let mut e = self.log10_abs().floor() as i64;
        let mut v = chiffres_de(e);
        if v >= pow10(sig as u32) {
            e += 1;
            v = chiffres_de(e);
        } else if v < pow10((sig - 1) as u32) {
            e -= 1;
            v = chiffres_de(e);
        }

        let s = v.to_str_radix(10);
        let (tete, queue) = s.split_at(1);
        let signe = if self.m.is_negative() { "-" } else { "" };
        if queue.is_empty() {
            format!("{signe}{tete}e{e}")
        } else {
            format!("{signe}{tete}.{queue}e{e}")
        }
    }

    /// Lit "[-]123.456[e-7]" (arrondi au plus proche sur la grille).
    pub fn lire_decimal(texte: &str, bits: u32) -> Resultat<Reel> {
        let t = texte.trim();
        if t.is_empty() {
            return Err(Erreur::Lecture("entrée vide".into()));
        }

        let (neg, reste) = match t.as_bytes()[0] {
            b'-' => (true, &t[1..]),
            b'+' => (false, &t[1..]),
            _ => (false, t),
        };

        let (mantisse, exposant) = match reste.find(|c: char| c == 'e' || c == 'E') {
            Some(i) => {
                let e = reste[i + 1..]
                    .parse::<i64>()
                    .map_err(|_| Erreur::Lecture(format!("exposant illisible dans {t:?}")))?;
                (&reste[..i], e)
            }
            None => (reste, 0),
        };

        let (ent, frac) = mantisse.split_once('.').unwrap_or((mantisse, ""));
        let ok = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (ent.is_empty() && frac.is_empty()) || !ok(ent) || !ok(frac) {
            return Err(Erreur::Lecture(format!("caractère inattendu dans {t:?}")));
        }

        let k = exposant - frac.len() as i64;
        if k.abs() > 100_000 {
            return Err(Erreur::Lecture(format!("exposant hors bornes dans {t:?}")));
        }

        let chiffres = format!("{ent}{frac}");
        let d = BigInt::parse_bytes(chiffres.as_bytes(), 10)
            .ok_or_else(|| Erreur::Lecture(format!("nombre illisible : {t:?}")))?;

        let m = if k >= 0 {
            (d * pow10(k as u32)) << bits
        } else {
            div_arrondie(&(d << bits), &pow10((-k) as u32))
        };

        Ok(Self {
            m: if neg { -m } else { m },
            bits,
        })
    }
}

/* ------------------------ Opérateurs ------------------------ */

impl Add<&Reel> for &Reel {
    type Output = Reel;
    fn add(self, rhs: &Reel) -> Reel {
        Reel {
            m: &self.m + &*rhs.mantisse_alignee(self.bits),
            bits: self.bits,
        }
    }
}

impl Add<&Reel> for Reel {
    type Output = Reel;
    fn add(mut self, rhs: &Reel) -> Reel {
        self += rhs;
        self
    }
}

impl Add for Reel {
    type Output = Reel;
    fn add(self, rhs: Reel) -> Reel {
        self + &rhs
    }
}

impl Sub<&Reel> for &Reel {
    type Output = Reel;
    fn sub(self, rhs: &Reel) -> Reel {
        Reel {
            m: &self.m - &*rhs.mantisse_alignee(self.bits),
            bits: self.bits,
        }
    }
}

impl Sub<&Reel> for Reel {
    type Output = Reel;
    fn sub(mut self, rhs: &Reel) -> Reel {
        self -= rhs;
        self
    }
}

impl Sub for Reel {
    type Output = Reel;
    fn sub(self, rhs: Reel) -> Reel {
        self - &rhs
    }
}

impl Mul<&Reel> for &Reel {
    type Output = Reel;
    fn mul(self, rhs: &Reel) -> Reel {
        Reel {
            m: (&self.m * &*rhs.mantisse_alignee(self.bits)) >> self.bits,
            bits: self.bits,
        }
    }
}

impl Mul<&Reel> for Reel {
    type Output = Reel;
    fn mul(self, rhs: &Reel) -> Reel {
        &self * rhs
    }
}

impl Mul for Reel {
    type Output = Reel;
    fn mul(self, rhs: Reel) -> Reel {
        &self * &rhs
    }
}

impl Neg for &Reel {
    type Output = Reel;
    fn neg(self) -> Reel {
        Reel {
            m: -&self.m,
            bits: self.bits,
        }
    }
}

impl Neg for Reel {
    type Output = Reel;
    fn neg(self) -> Reel {
        Reel {
            m: -self.m,
            bits: self.bits,
        }
    }
}

impl AddAssign<&Reel> for Reel {
    fn add_assign(&mut self, rhs: &Reel) {
        let autre = rhs.mantisse_alignee(self.bits);
        self.m += &*autre;
    }
}

impl SubAssign<&Reel> for Reel {
    fn sub_assign(&mut self, rhs: &Reel) {
        let autre = rhs.mantisse_alignee(self.bits);
        self.m -= &*autre;
    }
}

/* ------------------------ Affichage ------------------------ */

impl fmt::Display for Reel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chiffres = f
            .precision()
            .unwrap_or_else(|| self.chiffres_nominaux() as usize);
        f.write_str(&self.en_decimal(chiffres))
    }
}

/* ------------------------ serde (texte décimal + bits) ------------------------ */

#[derive(Serialize, Deserialize)]
struct ReelTexte {
    bits: u32,
    valeur: String,
}

impl Serialize for Reel {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        ReelTexte {
            bits: self.bits,
            valeur: self.en_decimal(self.chiffres_exacts()),
        }
        .serialize(s)
    }
}

impl<'de> Deserialize<'de> for Reel {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let t = ReelTexte::deserialize(d)?;
        Reel::lire_decimal(&t.valeur, t.bits).map_err(serde::de::Error::custom)
    }
}

//! Contexte de précision.
//!
//! Une `Precision` est un nombre de chiffres décimaux validé. Elle est passée
//! explicitement aux fonctions du noyau ; les opérations publiques acceptent
//! `Option<u32>` et retombent sur la précision ambiante du thread quand on ne
//! leur donne rien.
//!
//! La précision ambiante n'est modifiée que par une `PortePrecision` : la valeur
//! précédente est restaurée à la destruction de la porte, y compris sur `?` et
//! sur panique.

use std::cell::Cell;

use super::erreur::{Erreur, Resultat};

pub const PRECISION_MIN: u32 = 10;
pub const PRECISION_MAX: u32 = 5000;
pub const PRECISION_DEFAUT: u32 = 50;

/// Chiffres de garde ajoutés à la précision demandée pour le calcul interne.
pub const GARDE_DECIMALE: u32 = 20;

thread_local! {
    static AMBIANTE: Cell<u32> = const { Cell::new(PRECISION_DEFAUT) };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Precision {
    chiffres: u32,
}

impl Precision {
    pub fn new(chiffres: u32) -> Resultat<Self> {
        if !(PRECISION_MIN..=PRECISION_MAX).contains(&chiffres) {
            return Err(Erreur::PrecisionInvalide {
                chiffres,
                min: PRECISION_MIN,
                max: PRECISION_MAX,
            });
        }
        Ok(Self { chiffres })
    }

    /// Précision ambiante du thread courant.
    pub fn ambiante() -> Self {
        Self {
            chiffres: precision_ambiante(),
        }
    }

    pub fn ou_ambiante(chiffres: Option<u32>) -> Resultat<Self> {
        match chiffres {
            Some(c) => Self::new(c),
            None => Ok(Self::ambiante()),
        }
    }

    /// Chiffres décimaux demandés.
    pub fn chiffres(self) -> u32 {
        self.chiffres
    }

    /// Bits de la virgule fixe interne (chiffres + garde).
    pub fn bits(self) -> u32 {
        bits_pour(self.chiffres + GARDE_DECIMALE)
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self {
            chiffres: PRECISION_DEFAUT,
        }
    }
}

pub(crate) fn bits_pour(chiffres: u32) -> u32 {
    (chiffres as f64 * std::f64::consts::LOG2_10).ceil() as u32
}

pub fn precision_ambiante() -> u32 {
    AMBIANTE.with(|c| c.get())
}

/// Fixe la précision ambiante jusqu'à la destruction de la porte.
#[must_use = "la précision précédente est restaurée dès que la porte est détruite"]
#[derive(Debug)]
pub struct PortePrecision {
    precedente: u32,
}

impl PortePrecision {
    pub fn ouvrir(ctx: Precision) -> Self {
        let precedente = AMBIANTE.with(|c| c.replace(ctx.chiffres));
        Self { precedente }
    }
}

impl Drop for PortePrecision {
    fn drop(&mut self) {
        AMBIANTE.with(|c| c.set(self.precedente));
    }
}

/// Exécute `f` sous la précision demandée (ou ambiante), puis restaure.
pub fn avec_precision<T>(
    chiffres: Option<u32>,
    f: impl FnOnce(Precision) -> Resultat<T>,
) -> Resultat<T> {
    let ctx = Precision::ou_ambiante(chiffres)?;
    let _porte = PortePrecision::ouvrir(ctx);
    f(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bornes() {
        assert!(Precision::new(9).is_err());
        assert!(Precision::new(5001).is_err());
        assert_eq!(Precision::new(10).map(|p| p.chiffres()), Ok(10));
    }

    #[test]
    fn bits_couvrent_les_chiffres() {
        let p = Precision::new(50).unwrap();
        // 70 chiffres ≈ 232.5 bits
        assert_eq!(p.bits(), 233);
    }

    #[test]
    fn porte_restaure() {
        let avant = precision_ambiante();
        {
            let _p = PortePrecision::ouvrir(Precision::new(77).unwrap());
            assert_eq!(precision_ambiante(), 77);
            {
                let _q = PortePrecision::ouvrir(Precision::new(31).unwrap());
                assert_eq!(precision_ambiante(), 31);
            }
            assert_eq!(precision_ambiante(), 77);
        }
        assert_eq!(precision_ambiante(), avant);
    }

    #[test]
    fn avec_precision_restaure_sur_erreur() {
        let avant = precision_ambiante();
        let r: Resultat<()> = avec_precision(Some(40), |ctx| {
            assert_eq!(precision_ambiante(), 40);
            Err(Erreur::Domaine(format!("essai {}", ctx.chiffres())))
        });
        assert!(r.is_err());
        assert_eq!(precision_ambiante(), avant);

        // précision invalide : rien n'est modifié
        let r: Resultat<()> = avec_precision(Some(2), |_| Ok(()));
        assert!(matches!(r, Err(Erreur::PrecisionInvalide { .. })));
        assert_eq!(precision_ambiante(), avant);
    }

    #[test]
    fn avec_precision_restaure_sur_panique() {
        let avant = precision_ambiante();
        let r = std::panic::catch_unwind(|| {
            let _ = avec_precision(Some(60), |_| -> Resultat<()> { panic!("boum") });
        });
        assert!(r.is_err());
        assert_eq!(precision_ambiante(), avant);
    }
}

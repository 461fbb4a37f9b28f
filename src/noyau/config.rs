// src/noyau/config.rs
//
// Configuration de calcul (JSON, tous les champs optionnels).
//
// {
//   "precision": 50,
//   "serie": { "max_termes": 600000, "fenetre": 35, "marge_seuil": 10 },
//   "recherche": { "max_coeff": 1000000, "max_iterations": 30000, "fraction_tolerance": 0.75 },
//   "source": "table",
//   "exposant_seuil_residu": 96,
//   "precisions_stabilite": [100, 150, 200, 250, 300]
// }

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use super::erreur::{Erreur, Resultat};
use super::precision::{Precision, PRECISION_DEFAUT};
use super::pslq::BornesRecherche;
use super::serie::ParametresSerie;
use super::verification::{
    seuil_puissance_dix, ParametresVerification, SourceRelation, EXPOSANT_SEUIL_DEFAUT,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoixSource {
    #[default]
    Table,
    Recherche,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigCalcul {
    pub precision: u32,
    pub serie: ParametresSerie,
    pub recherche: BornesRecherche,
    pub source: ChoixSource,
    pub exposant_seuil_residu: u32,
    pub precisions_stabilite: Vec<u32>,
}

impl Default for ConfigCalcul {
    fn default() -> Self {
        Self {
            precision: PRECISION_DEFAUT,
            serie: ParametresSerie::default(),
            recherche: BornesRecherche::default(),
            source: ChoixSource::Table,
            exposant_seuil_residu: EXPOSANT_SEUIL_DEFAUT,
            precisions_stabilite: vec![100, 150, 200, 250, 300],
        }
    }
}

impl ConfigCalcul {
    pub fn validate(&self) -> Resultat<()> {
        Precision::new(self.precision)?;
        self.serie.validate()?;
        self.recherche.validate()?;
        if self.exposant_seuil_residu == 0 {
            return Err(Erreur::Config("exposant_seuil_residu doit être ≥ 1".into()));
        }
        if self.precisions_stabilite.len() < 2 {
            return Err(Erreur::Config(
                "precisions_stabilite : au moins deux précisions".into(),
            ));
        }
        if !self.precisions_stabilite.windows(2).all(|w| w[0] < w[1]) {
            return Err(Erreur::Config(
                "precisions_stabilite doit être strictement croissante".into(),
            ));
        }
        for &p in &self.precisions_stabilite {
            Precision::new(p)?;
        }
        Ok(())
    }

    pub fn from_json(texte: &str) -> Resultat<Self> {
        let c: Self = serde_json::from_str(texte)
            .map_err(|e| Erreur::Config(format!("JSON : {e}")))?;
        c.validate()?;
        Ok(c)
    }

    pub fn from_fichier(chemin: &Path) -> Resultat<Self> {
        let texte = std::fs::read_to_string(chemin)
            .map_err(|e| Erreur::Config(format!("{} : {e}", chemin.display())))?;
        debug!(chemin = %chemin.display(), "configuration lue");
        Self::from_json(&texte)
    }

    pub fn contexte(&self) -> Resultat<Precision> {
        Precision::new(self.precision)
    }

    pub fn parametres_verification(&self) -> ParametresVerification {
        let source = match self.source {
            ChoixSource::Table => SourceRelation::Table,
            ChoixSource::Recherche => SourceRelation::Recherche(self.recherche.clone()),
        };
        ParametresVerification {
            serie: self.serie.clone(),
            source,
            seuil: seuil_puissance_dix(self.exposant_seuil_residu),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defauts() {
        let c = ConfigCalcul::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.precision, 50);
        assert_eq!(c.serie.fenetre, 35);
        assert_eq!(c.parametres_verification(), ParametresVerification::default());
    }

    #[test]
    fn json_partiel() {
        let c = ConfigCalcul::from_json(
            r#"{ "precision": 80, "serie": { "fenetre": 40 }, "source": "recherche" }"#,
        )
        .unwrap();
        assert_eq!(c.precision, 80);
        assert_eq!(c.serie.fenetre, 40);
        assert_eq!(c.serie.max_termes, 600_000);
        assert!(matches!(
            c.parametres_verification().source,
            SourceRelation::Recherche(_)
        ));
        assert_eq!(c.contexte().unwrap().chiffres(), 80);
    }

    #[test]
    fn json_invalide() {
        assert!(matches!(
            ConfigCalcul::from_json(r#"{ "precision": 3 }"#),
            Err(Erreur::PrecisionInvalide { .. })
        ));
        assert!(matches!(
            ConfigCalcul::from_json(r#"{ "inconnu": 1 }"#),
            Err(Erreur::Config(_))
        ));
        assert!(matches!(
            ConfigCalcul::from_json(r#"{ "precisions_stabilite": [200, 100] }"#),
            Err(Erreur::Config(_))
        ));
        assert!(matches!(
            ConfigCalcul::from_json(r#"{ "serie": { "fenetre": 0 } }"#),
            Err(Erreur::Config(_))
        ));
    }

    #[test]
    fn fichier_absent() {
        let e = ConfigCalcul::from_fichier(Path::new("/nonexistent/s42.json")).unwrap_err();
        assert!(matches!(e, Erreur::Config(_)));
    }
}

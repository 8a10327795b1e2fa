#[cfg(test)]
mod tests {
    use crate::Compounds::compound::{ChemicalClass, Compound};
    use crate::Compounds::compound_guide::CompoundGuide;
    use crate::Compounds::reaction::{CompoundQuantity, PerformedReaction, ReactionLog};
    use crate::Descriptors::descriptor::{
        BoolDescriptor, CatDescriptor, Descriptor, DescriptorMeta, NumDescriptor, OrdDescriptor,
    };
    use crate::Descriptors::registry::DescriptorRegistry;
    use crate::Descriptors::values::{DescriptorValue, MolDescriptorValue};
    use crate::Export::model_input::{ModelDataset, k_fold_splits};
    use crate::Export::table::{ExportError, compound_table, reaction_table};
    use crate::Export::writers::{arff_value, save_arff, write_arff, write_csv};
    use std::fs;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    const LAB: &str = "Norquist";

    fn meta(heading: &str) -> DescriptorMeta {
        DescriptorMeta::new(heading, heading, "drp", "1")
    }

    fn value(descriptor: &Arc<Descriptor>, value: DescriptorValue) -> MolDescriptorValue {
        MolDescriptorValue::new(descriptor.clone(), value).unwrap()
    }

    fn guide() -> CompoundGuide {
        let mut guide = CompoundGuide::new();
        let mw: Arc<Descriptor> = Arc::new(NumDescriptor::new(meta("mw"), Some(0.0), None).into());
        let organic: Arc<Descriptor> = Arc::new(BoolDescriptor::new(meta("organic")).into());

        let mut salt = Compound::new("NaCl", "sodium chloride", LAB)
            .with_csid(5044)
            .with_formula("NaCl");
        salt.add_chemical_class(ChemicalClass::new("Inorganic Salt"));
        salt.set_descriptor_value(value(&mw, DescriptorValue::Num(58.44)));
        salt.set_descriptor_value(value(&organic, DescriptorValue::Bool(false)));
        guide.add(salt).unwrap();

        let mut amine = Compound::new("dab", "1,4-diaminobutane", LAB).with_formula("C_{4}H_{12}N_{2}");
        amine.add_chemical_class(ChemicalClass::new("Org"));
        amine.add_chemical_class(ChemicalClass::new("Amine"));
        amine.set_descriptor_value(value(&mw, DescriptorValue::Num(88.15)));
        guide.add(amine).unwrap();
        guide
    }

    #[test]
    fn test_compound_csv() {
        let guide = guide();
        let table = compound_table(&guide, guide.compounds(), false).unwrap();
        assert_eq!(
            table.headers(),
            vec![
                "abbrev", "name", "CSID", "INCHI", "smiles", "formula", "custom",
                "chemicalClass_1", "chemicalClass_2"
            ]
        );
        let mut out = Vec::new();
        write_csv(&table, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "NaCl,sodium chloride,5044,,,NaCl,False,Inorganic Salt,");
        assert_eq!(lines[2], "dab,\"1,4-diaminobutane\",,,,C_{4}H_{12}N_{2},False,Org,Amine");
    }

    #[test]
    fn test_class_columns_follow_the_whole_guide() {
        let guide = guide();
        // only the salt is exported, but the amine has two classes
        let table = compound_table(&guide, guide.compounds().iter().take(1), false).unwrap();
        assert!(table.column("chemicalClass_2").is_some());
        assert_eq!(
            table.column("chemicalClass_1").unwrap().arff_attribute(),
            "@attribute chemicalClass_1 {\"Inorganic Salt\",\"Org\",\"Amine\"}"
        );
    }

    #[test]
    fn test_expanded_compound_table() {
        let guide = guide();
        let table = compound_table(&guide, guide.compounds(), true).unwrap();
        let headers = table.headers();
        assert_eq!(&headers[9..], &["organic_drp_1", "mw_drp_1"]);
        assert_eq!(table.value(0, "mw_drp_1"), Some("58.44"));
        assert_eq!(table.value(0, "organic_drp_1"), Some("False"));
        assert_eq!(table.value(1, "organic_drp_1"), None);
    }

    #[test]
    fn test_compound_arff() {
        let guide = guide();
        let table = compound_table(&guide, guide.compounds(), true).unwrap();
        let mut out = Vec::new();
        write_arff(&table, "compounds", &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "@relation compounds");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "@attribute abbrev string");
        assert_eq!(lines[4], "@attribute CSID numeric");
        assert_eq!(lines[8], "@attribute custom {True, False}");
        assert_eq!(lines[11], "@attribute organic_drp_1 {True, False}");
        assert_eq!(lines[12], "@attribute mw_drp_1 numeric");
        assert_eq!(lines[14], "@data");
        assert_eq!(
            lines[15],
            "NaCl,\"sodium chloride\",5044,?,?,NaCl,False,\"Inorganic Salt\",?,False,58.44"
        );
        assert_eq!(
            lines[16],
            "dab,\"1,4-diaminobutane\",?,?,?,C_{4}H_{12}N_{2},False,\"Org\",\"Amine\",?,88.15"
        );
    }

    #[test]
    fn test_arff_value_quoting() {
        assert_eq!(arff_value(None, false), "?");
        assert_eq!(arff_value(Some(""), true), "?");
        assert_eq!(arff_value(Some("NaCl"), false), "NaCl");
        assert_eq!(arff_value(Some("NaCl"), true), "\"NaCl\"");
        assert_eq!(arff_value(Some("say \"hi\""), false), "\"say \\\"hi\\\"\"");
        assert_eq!(arff_value(Some("a,b"), false), "\"a,b\"");
    }

    #[test]
    fn test_unbounded_ordinal_cannot_be_exported() {
        let mut guide = CompoundGuide::new();
        let donors: Arc<Descriptor> = Arc::new(OrdDescriptor::new(meta("donors"), Some(0), None).into());
        let mut compound = Compound::new("X", "x", LAB);
        compound.set_descriptor_value(value(&donors, DescriptorValue::Ord(2)));
        guide.add(compound).unwrap();
        assert!(compound_table(&guide, guide.compounds(), false).is_ok());
        assert!(matches!(
            compound_table(&guide, guide.compounds(), true),
            Err(ExportError::Descriptor(_))
        ));
    }

    fn reaction_log(outcome: &Arc<Descriptor>, temperature: &Arc<Descriptor>) -> ReactionLog {
        let mut log = ReactionLog::new();
        for (i, (temp, crystal)) in [(90.0, true), (110.0, false), (120.0, true)].iter().enumerate() {
            let mut r = PerformedReaction::new(&format!("JMS-{}", i + 1), LAB);
            r.add_compound(CompoundQuantity::new("NaCl", "reactant", Some(0.25)));
            if i == 0 {
                r.add_compound(CompoundQuantity::new("H2O", "solvent", None));
            }
            r.set_descriptor_value(value(temperature, DescriptorValue::Num(*temp)));
            r.set_descriptor_value(value(outcome, DescriptorValue::Bool(*crystal)));
            log.add(r).unwrap();
        }
        log
    }

    #[test]
    fn test_reaction_table() {
        let outcome: Arc<Descriptor> =
            Arc::new(BoolDescriptor::new(meta("boolean_crystallisation_outcome")).into());
        let temperature: Arc<Descriptor> =
            Arc::new(NumDescriptor::new(meta("reaction_temperature"), None, None).into());
        let log = reaction_log(&outcome, &temperature);
        let table = reaction_table(&log, log.iter(), true).unwrap();
        assert_eq!(
            table.headers(),
            vec![
                "reference", "labGroup", "valid",
                "compound_1", "compound_1_role", "compound_1_amount",
                "compound_2", "compound_2_role", "compound_2_amount",
                "boolean_crystallisation_outcome_drp_1", "reaction_temperature_drp_1",
            ]
        );
        let mut out = Vec::new();
        write_csv(&table, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "JMS-1,Norquist,True,NaCl,reactant,0.25,H2O,solvent,,True,90");
        assert_eq!(lines[2], "JMS-2,Norquist,True,NaCl,reactant,0.25,,,,False,110");
    }

    #[test]
    fn test_model_dataset() {
        let outcome: Arc<Descriptor> =
            Arc::new(BoolDescriptor::new(meta("boolean_crystallisation_outcome")).into());
        let temperature: Arc<Descriptor> =
            Arc::new(NumDescriptor::new(meta("reaction_temperature"), None, None).into());
        let mut registry = DescriptorRegistry::new();
        registry.get_or_create(outcome.as_ref().clone()).unwrap();
        registry.get_or_create(temperature.as_ref().clone()).unwrap();
        registry
            .get_or_create(CatDescriptor::new(meta("colour"), vec!["red".to_string()]).into())
            .unwrap();

        let mut log = reaction_log(&outcome, &temperature);
        log.invalidate(LAB, "JMS-2");
        log.invalidate_for_compound(LAB, "H2O");

        let mut header_file = NamedTempFile::new().unwrap();
        writeln!(header_file, "reaction_temperature").unwrap();
        let dataset = ModelDataset::from_header_file(
            &registry,
            header_file.path(),
            &["boolean_crystallisation_outcome".to_string()],
        )
        .unwrap();
        assert_eq!(dataset.predictors().len(), 1);
        assert_eq!(dataset.responses().len(), 1);

        // JMS-2 is invalid, JMS-1 used water and is stale
        let table = dataset.table(&log).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.value(0, "reference"), Some("JMS-3"));

        let out = NamedTempFile::new().unwrap();
        save_arff(&table, "crystallisation", out.path()).unwrap();
        let text = fs::read_to_string(out.path()).unwrap();
        assert!(text.contains("@attribute reaction_temperature_drp_1 numeric\n"));
        assert!(text.ends_with("@data\nJMS-3,120,True\n"));
    }

    #[test]
    fn test_model_dataset_selection_errors() {
        let registry = DescriptorRegistry::new();
        assert!(matches!(
            ModelDataset::from_headings(&registry, &["x".to_string()], &["y".to_string()]),
            Err(ExportError::EmptySelection("predictor"))
        ));
        let flag: Arc<Descriptor> = Arc::new(BoolDescriptor::new(meta("flag")).into());
        assert!(matches!(
            ModelDataset::new(vec![flag.clone()], vec![flag]),
            Err(ExportError::OverlappingSelection(_))
        ));
    }

    #[test]
    fn test_arff_header_covers_values_recorded_before_a_merge() {
        let mut registry = DescriptorRegistry::new();
        let red = registry
            .get_or_create(CatDescriptor::new(meta("colour"), vec!["red".to_string()]).into())
            .unwrap();
        let mut guide = CompoundGuide::new();
        let mut a = Compound::new("A", "a", LAB);
        a.set_descriptor_value(value(&red, DescriptorValue::Cat("red".to_string())));
        guide.add(a).unwrap();

        let blue = registry
            .get_or_create(CatDescriptor::new(meta("colour"), vec!["blue".to_string()]).into())
            .unwrap();
        let mut b = Compound::new("B", "b", LAB);
        b.set_descriptor_value(value(&blue, DescriptorValue::Cat("blue".to_string())));
        guide.add(b).unwrap();

        let table = compound_table(&guide, guide.compounds(), true).unwrap();
        let mut out = Vec::new();
        write_arff(&table, "compounds", &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("@attribute colour_drp_1 {red,blue}\n"));
        assert!(text.ends_with(",red\nB,b,?,?,?,?,False,blue\n"));
    }

    #[test]
    fn test_class_labels_are_escaped_in_the_header() {
        let mut guide = CompoundGuide::new();
        let mut compound = Compound::new("X", "x", LAB);
        compound.add_chemical_class(ChemicalClass::new("so-called \"salt\""));
        guide.add(compound).unwrap();
        let table = compound_table(&guide, guide.compounds(), false).unwrap();
        let expected = "{\"so-called \\\"salt\\\"\"}";
        assert_eq!(table.column("chemicalClass_1").unwrap().arff, expected);
        assert_eq!(
            arff_value(table.value(0, "chemicalClass_1"), true),
            &expected[1..expected.len() - 1]
        );
    }

    #[test]
    fn test_model_dataset_folds() {
        let outcome: Arc<Descriptor> =
            Arc::new(BoolDescriptor::new(meta("boolean_crystallisation_outcome")).into());
        let temperature: Arc<Descriptor> =
            Arc::new(NumDescriptor::new(meta("reaction_temperature"), None, None).into());
        let log = reaction_log(&outcome, &temperature);
        let dataset = ModelDataset::new(vec![temperature.clone()], vec![outcome.clone()]).unwrap();

        let folds = dataset.folds(&log, 2).unwrap();
        assert_eq!(folds.len(), 2);
        let (train, test) = &folds[0];
        assert_eq!(test.len(), 2);
        assert_eq!(train.len(), 1);
        assert_eq!(train.value(0, "reference"), Some("JMS-3"));
        assert_eq!(folds[1].1.value(0, "reference"), Some("JMS-3"));
        assert_eq!(train.headers(), test.headers());

        let dir = tempfile::tempdir().unwrap();
        let written = dataset.save_folds(&log, 2, "crystallisation", dir.path()).unwrap();
        assert_eq!(written.len(), 4);
        assert!(written[0].ends_with("crystallisation_fold1_train.arff"));
        let text = fs::read_to_string(&written[3]).unwrap();
        assert!(text.ends_with("@data\nJMS-3,120,True\n"));
    }

    #[test]
    fn test_k_fold_splits() {
        let splits = k_fold_splits(7, 3);
        assert_eq!(splits.len(), 3);
        assert_eq!(splits[0].1, vec![0, 1, 2]);
        assert_eq!(splits[1].1, vec![3, 4]);
        assert_eq!(splits[2].1, vec![5, 6]);
        assert_eq!(splits[1].0, vec![0, 1, 2, 5, 6]);
        assert_eq!(k_fold_splits(2, 5).len(), 2);
        assert!(k_fold_splits(0, 3).is_empty());
    }
}

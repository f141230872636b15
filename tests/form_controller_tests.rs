/// Form session behaviour that needs no external service
use netway_contact_form::config::Config;
use netway_contact_form::errors::AppError;
use netway_contact_form::form_controller::{FormController, FormPhase};
use netway_contact_form::models::{ContactRecord, FormField, PersonType};
use netway_contact_form::submission::SubmitOutcome;

fn controller() -> FormController {
    FormController::new(&Config::default()).unwrap()
}

#[cfg(test)]
mod mode_switching_tests {
    use super::*;

    #[tokio::test]
    async fn test_switching_modes_preserves_both_records() {
        let form = controller();
        form.handle_field_change(FormField::Nome, "João da Silva")
            .unwrap();
        form.handle_field_change(FormField::Cpf, "123.456.789-00")
            .unwrap();
        form.handle_field_change(FormField::Telefone, "21987654321")
            .unwrap();

        form.set_mode(PersonType::Business).unwrap();
        form.handle_field_change(FormField::Responsavel, "Ana Lima")
            .unwrap();
        form.handle_field_change(FormField::Cpf, "987.654.321-00")
            .unwrap();

        form.set_mode(PersonType::Individual).unwrap();
        let individual = form.individual();
        assert_eq!(individual.nome, "João da Silva");
        assert_eq!(individual.cpf, "123.456.789-00");
        assert_eq!(individual.contact.telefone, "(21) 98765-4321");

        let business = form.business();
        assert_eq!(business.representative.responsavel, "Ana Lima");
        assert_eq!(business.representative.cpf, "987.654.321-00");
    }

    #[tokio::test]
    async fn test_active_record_follows_mode() {
        let form = controller();
        assert!(matches!(form.active_record(), ContactRecord::Individual(_)));

        form.set_mode(PersonType::Business).unwrap();
        assert_eq!(form.mode(), PersonType::Business);
        assert_eq!(form.active_record().person_type(), PersonType::Business);
    }

    #[tokio::test]
    async fn test_field_outside_active_mode_is_rejected() {
        let form = controller();
        let result = form.handle_field_change(FormField::RazaoSocial, "ACME");
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        form.set_mode(PersonType::Business).unwrap();
        let result = form.handle_field_change(FormField::DataNascimento, "1990-01-01");
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}

#[cfg(test)]
mod field_formatting_tests {
    use super::*;

    #[tokio::test]
    async fn test_masks_applied_inline() {
        let form = controller();
        form.handle_field_change(FormField::Telefone, "119").unwrap();
        form.handle_field_change(FormField::Cep, "013101").unwrap();
        let record = form.individual();
        assert_eq!(record.contact.telefone, "(11) 9");
        assert_eq!(record.address.cep, "01310-1");

        form.set_mode(PersonType::Business).unwrap();
        form.handle_field_change(FormField::Cnpj, "11222333").unwrap();
        assert_eq!(form.business().cnpj, "11.222.333");
    }

    #[tokio::test]
    async fn test_free_text_fields_kept_verbatim() {
        let form = controller();
        form.handle_field_change(FormField::Rg, "12.345.678-9").unwrap();
        form.handle_field_change(FormField::Comentarios, "  Prefiro WhatsApp  ")
            .unwrap();
        form.handle_field_change(FormField::Plano, "plano-3").unwrap();
        let record = form.individual();
        assert_eq!(record.rg, "12.345.678-9");
        assert_eq!(record.contact.comentarios, "  Prefiro WhatsApp  ");
        assert_eq!(record.contact.plano, "plano-3");
    }

    #[tokio::test]
    async fn test_defaults_for_contact_preferences() {
        let form = controller();
        let snapshot = form.snapshot();
        assert_eq!(snapshot.individual.contact.forma_contato, "ligacao");
        assert_eq!(snapshot.business.contact.horario, "manha");
        assert!(!snapshot.loading_cep);
        assert!(!snapshot.loading_cnpj);
        assert_eq!(snapshot.phase, FormPhase::Editing);
    }
}

#[cfg(test)]
mod required_field_tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_business_submit_is_blocked() {
        let form = controller();
        form.set_mode(PersonType::Business).unwrap();

        match form.submit().await {
            SubmitOutcome::Blocked { missing } => {
                assert_eq!(
                    missing,
                    vec![
                        FormField::Cnpj,
                        FormField::RazaoSocial,
                        FormField::Cep,
                        FormField::Numero,
                        FormField::Responsavel,
                        FormField::Telefone,
                        FormField::Email,
                    ]
                );
            }
            other => panic!("Expected blocked submit, got {:?}", other),
        }
        assert_eq!(form.phase(), FormPhase::Editing);
    }

    #[tokio::test]
    async fn test_optional_fields_do_not_block() {
        let form = controller();
        form.handle_field_change(FormField::Nome, "Maria").unwrap();
        form.handle_field_change(FormField::Cep, "01310").unwrap();
        form.handle_field_change(FormField::Numero, "10").unwrap();
        form.handle_field_change(FormField::Telefone, "11").unwrap();

        // Email is the only required field left; CPF/RG stay optional
        match form.submit().await {
            SubmitOutcome::Blocked { missing } => assert_eq!(missing, vec![FormField::Email]),
            other => panic!("Expected blocked submit, got {:?}", other),
        }
    }
}

#[cfg(test)]
mod serialization_tests {
    use super::*;

    #[tokio::test]
    async fn test_snapshot_uses_wire_names() {
        let form = controller();
        form.handle_field_change(FormField::PontoReferencia, "Próximo ao metrô")
            .unwrap();
        let value = serde_json::to_value(form.snapshot()).unwrap();
        assert_eq!(value["mode"], "pf");
        assert_eq!(value["phase"], "editing");
        assert_eq!(value["loadingCep"], false);
        assert_eq!(value["individual"]["pontoReferencia"], "Próximo ao metrô");
    }

    #[tokio::test]
    async fn test_blocked_outcome_serializes_field_keys() {
        let form = controller();
        let value = serde_json::to_value(form.submit().await).unwrap();
        assert_eq!(value["status"], "blocked");
        assert_eq!(value["missing"][0], "nome");
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::formatters::format_postal_code;

/// Plan choices offered by the form.
pub const PLAN_OPTIONS: &[&str] = &["plano-1", "plano-2", "plano-3", "plano-4", "plano-5"];

/// Invoice due-day choices (days of the month).
pub const DUE_DAY_OPTIONS: &[&str] = &["5", "10", "15", "20", "25", "30"];

pub const DEFAULT_CONTACT_PREFERENCE: &str = "ligacao";
pub const DEFAULT_CONTACT_WINDOW: &str = "manha";

// ============ Form Mode ============

/// Which record the form is currently editing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersonType {
    /// Pessoa Física.
    #[default]
    #[serde(rename = "pf")]
    Individual,
    /// Pessoa Jurídica.
    #[serde(rename = "pj")]
    Business,
}

impl PersonType {
    /// Label sent as `tipoContato` in the submission payload.
    pub fn label(&self) -> &'static str {
        match self {
            PersonType::Individual => "Pessoa Física",
            PersonType::Business => "Pessoa Jurídica",
        }
    }
}

// ============ Form Fields ============

/// Every editable field of the form, keyed by its wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    Nome,
    Cpf,
    Rg,
    DataNascimento,
    Cnpj,
    RazaoSocial,
    NomeFantasia,
    Cep,
    Endereco,
    Numero,
    Complemento,
    Bairro,
    Cidade,
    Estado,
    PontoReferencia,
    Responsavel,
    Cargo,
    Telefone,
    Email,
    Plano,
    Vencimento,
    FormaContato,
    Horario,
    Comentarios,
}

impl FormField {
    /// Wire name of the field, as used in the submission payload.
    pub fn key(&self) -> &'static str {
        match self {
            FormField::Nome => "nome",
            FormField::Cpf => "cpf",
            FormField::Rg => "rg",
            FormField::DataNascimento => "dataNascimento",
            FormField::Cnpj => "cnpj",
            FormField::RazaoSocial => "razaoSocial",
            FormField::NomeFantasia => "nomeFantasia",
            FormField::Cep => "cep",
            FormField::Endereco => "endereco",
            FormField::Numero => "numero",
            FormField::Complemento => "complemento",
            FormField::Bairro => "bairro",
            FormField::Cidade => "cidade",
            FormField::Estado => "estado",
            FormField::PontoReferencia => "pontoReferencia",
            FormField::Responsavel => "responsavel",
            FormField::Cargo => "cargo",
            FormField::Telefone => "telefone",
            FormField::Email => "email",
            FormField::Plano => "plano",
            FormField::Vencimento => "vencimento",
            FormField::FormaContato => "formaContato",
            FormField::Horario => "horario",
            FormField::Comentarios => "comentarios",
        }
    }

    /// Whether the field exists on the record for `mode`.
    pub fn applies_to(&self, mode: PersonType) -> bool {
        match self {
            FormField::Nome | FormField::DataNascimento => mode == PersonType::Individual,
            FormField::Cnpj
            | FormField::RazaoSocial
            | FormField::NomeFantasia
            | FormField::Responsavel
            | FormField::Cargo => mode == PersonType::Business,
            _ => true,
        }
    }
}

// ============ Records ============

/// Address block shared by both record shapes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub cep: String,
    pub endereco: String,
    pub numero: String,
    pub complemento: String,
    pub bairro: String,
    pub cidade: String,
    pub estado: String,
    pub ponto_referencia: String,
}

impl Address {
    fn field(&self, field: FormField) -> Option<&String> {
        match field {
            FormField::Cep => Some(&self.cep),
            FormField::Endereco => Some(&self.endereco),
            FormField::Numero => Some(&self.numero),
            FormField::Complemento => Some(&self.complemento),
            FormField::Bairro => Some(&self.bairro),
            FormField::Cidade => Some(&self.cidade),
            FormField::Estado => Some(&self.estado),
            FormField::PontoReferencia => Some(&self.ponto_referencia),
            _ => None,
        }
    }

    fn field_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::Cep => Some(&mut self.cep),
            FormField::Endereco => Some(&mut self.endereco),
            FormField::Numero => Some(&mut self.numero),
            FormField::Complemento => Some(&mut self.complemento),
            FormField::Bairro => Some(&mut self.bairro),
            FormField::Cidade => Some(&mut self.cidade),
            FormField::Estado => Some(&mut self.estado),
            FormField::PontoReferencia => Some(&mut self.ponto_referencia),
            _ => None,
        }
    }

    /// Overwrite street, district, city and state with a ViaCEP result.
    pub fn apply_address_lookup(&mut self, result: &AddressLookupResult) {
        self.endereco = result.street.clone();
        self.bairro = result.district.clone();
        self.cidade = result.city.clone();
        self.estado = result.state.clone();
    }
}

/// Company representative, embedded in the business record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Representative {
    pub responsavel: String,
    pub cpf: String,
    pub rg: String,
    pub cargo: String,
}

/// Contact preferences and plan choices shared by both record shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetails {
    pub telefone: String,
    pub email: String,
    pub plano: String,
    pub vencimento: String,
    pub forma_contato: String,
    pub horario: String,
    pub comentarios: String,
}

impl Default for ContactDetails {
    fn default() -> Self {
        Self {
            telefone: String::new(),
            email: String::new(),
            plano: String::new(),
            vencimento: String::new(),
            forma_contato: DEFAULT_CONTACT_PREFERENCE.to_string(),
            horario: DEFAULT_CONTACT_WINDOW.to_string(),
            comentarios: String::new(),
        }
    }
}

impl ContactDetails {
    fn field(&self, field: FormField) -> Option<&String> {
        match field {
            FormField::Telefone => Some(&self.telefone),
            FormField::Email => Some(&self.email),
            FormField::Plano => Some(&self.plano),
            FormField::Vencimento => Some(&self.vencimento),
            FormField::FormaContato => Some(&self.forma_contato),
            FormField::Horario => Some(&self.horario),
            FormField::Comentarios => Some(&self.comentarios),
            _ => None,
        }
    }

    fn field_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::Telefone => Some(&mut self.telefone),
            FormField::Email => Some(&mut self.email),
            FormField::Plano => Some(&mut self.plano),
            FormField::Vencimento => Some(&mut self.vencimento),
            FormField::FormaContato => Some(&mut self.forma_contato),
            FormField::Horario => Some(&mut self.horario),
            FormField::Comentarios => Some(&mut self.comentarios),
            _ => None,
        }
    }
}

/// Pessoa Física record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualRecord {
    pub nome: String,
    pub cpf: String,
    pub rg: String,
    pub data_nascimento: String,
    #[serde(flatten)]
    pub address: Address,
    #[serde(flatten)]
    pub contact: ContactDetails,
}

impl IndividualRecord {
    /// Fields the form marks as required for individuals.
    pub const REQUIRED: &'static [FormField] = &[
        FormField::Nome,
        FormField::Cep,
        FormField::Numero,
        FormField::Telefone,
        FormField::Email,
    ];

    pub fn field(&self, field: FormField) -> Option<&str> {
        let value = match field {
            FormField::Nome => Some(&self.nome),
            FormField::Cpf => Some(&self.cpf),
            FormField::Rg => Some(&self.rg),
            FormField::DataNascimento => Some(&self.data_nascimento),
            _ => self
                .address
                .field(field)
                .or_else(|| self.contact.field(field)),
        };
        value.map(String::as_str)
    }

    pub fn field_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::Nome => Some(&mut self.nome),
            FormField::Cpf => Some(&mut self.cpf),
            FormField::Rg => Some(&mut self.rg),
            FormField::DataNascimento => Some(&mut self.data_nascimento),
            _ => match self.address.field_mut(field) {
                Some(value) => Some(value),
                None => self.contact.field_mut(field),
            },
        }
    }
}

/// Pessoa Jurídica record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessRecord {
    pub cnpj: String,
    pub razao_social: String,
    pub nome_fantasia: String,
    #[serde(flatten)]
    pub address: Address,
    #[serde(flatten)]
    pub representative: Representative,
    #[serde(flatten)]
    pub contact: ContactDetails,
}

impl BusinessRecord {
    /// Fields the form marks as required for businesses.
    pub const REQUIRED: &'static [FormField] = &[
        FormField::Cnpj,
        FormField::RazaoSocial,
        FormField::Cep,
        FormField::Numero,
        FormField::Responsavel,
        FormField::Telefone,
        FormField::Email,
    ];

    pub fn field(&self, field: FormField) -> Option<&str> {
        let value = match field {
            FormField::Cnpj => Some(&self.cnpj),
            FormField::RazaoSocial => Some(&self.razao_social),
            FormField::NomeFantasia => Some(&self.nome_fantasia),
            FormField::Responsavel => Some(&self.representative.responsavel),
            FormField::Cpf => Some(&self.representative.cpf),
            FormField::Rg => Some(&self.representative.rg),
            FormField::Cargo => Some(&self.representative.cargo),
            _ => self
                .address
                .field(field)
                .or_else(|| self.contact.field(field)),
        };
        value.map(String::as_str)
    }

    pub fn field_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::Cnpj => Some(&mut self.cnpj),
            FormField::RazaoSocial => Some(&mut self.razao_social),
            FormField::NomeFantasia => Some(&mut self.nome_fantasia),
            FormField::Responsavel => Some(&mut self.representative.responsavel),
            FormField::Cpf => Some(&mut self.representative.cpf),
            FormField::Rg => Some(&mut self.representative.rg),
            FormField::Cargo => Some(&mut self.representative.cargo),
            _ => match self.address.field_mut(field) {
                Some(value) => Some(value),
                None => self.contact.field_mut(field),
            },
        }
    }

    /// Merge a CNPJá result, keeping the current value wherever the
    /// response has nothing to offer.
    pub fn apply_company_lookup(&mut self, result: &CompanyLookupResult) {
        merge_present(&mut self.razao_social, &result.legal_name);
        merge_present(&mut self.nome_fantasia, &result.trade_name);

        let address = &result.address;
        if let Some(zip) = present(&address.zip) {
            self.address.cep = format_postal_code(zip);
        }
        merge_present(&mut self.address.endereco, &address.street);
        merge_present(&mut self.address.numero, &address.number);
        merge_present(&mut self.address.complemento, &address.details);
        merge_present(&mut self.address.bairro, &address.district);
        merge_present(&mut self.address.cidade, &address.city);
        merge_present(&mut self.address.estado, &address.state);
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn merge_present(target: &mut String, value: &Option<String>) {
    if let Some(v) = present(value) {
        *target = v.to_string();
    }
}

/// One of the two record shapes, tagged by mode.
///
/// Serializes untagged so the record's fields can be flattened into the
/// submission payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ContactRecord {
    Individual(IndividualRecord),
    Business(BusinessRecord),
}

impl ContactRecord {
    pub fn person_type(&self) -> PersonType {
        match self {
            ContactRecord::Individual(_) => PersonType::Individual,
            ContactRecord::Business(_) => PersonType::Business,
        }
    }

    pub fn field(&self, field: FormField) -> Option<&str> {
        match self {
            ContactRecord::Individual(record) => record.field(field),
            ContactRecord::Business(record) => record.field(field),
        }
    }

    pub fn required_fields(&self) -> &'static [FormField] {
        match self {
            ContactRecord::Individual(_) => IndividualRecord::REQUIRED,
            ContactRecord::Business(_) => BusinessRecord::REQUIRED,
        }
    }

    /// Required fields that are still blank (presence only, no format checks).
    pub fn missing_required(&self) -> Vec<FormField> {
        self.required_fields()
            .iter()
            .copied()
            .filter(|f| self.field(*f).map_or(true, |v| v.trim().is_empty()))
            .collect()
    }
}

// ============ Lookup Results ============

/// Address fields produced by a successful ViaCEP lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressLookupResult {
    pub street: String,
    pub district: String,
    pub city: String,
    pub state: String,
}

/// Company fields produced by a CNPJá lookup. Absent values stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyLookupResult {
    pub legal_name: Option<String>,
    pub trade_name: Option<String>,
    pub address: CompanyAddress,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyAddress {
    pub zip: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub details: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

// ============ External API Models ============

/// ViaCEP `/ws/{cep}/json/` response.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ViaCepResponse {
    #[serde(default)]
    pub logradouro: String,
    #[serde(default)]
    pub bairro: String,
    #[serde(default)]
    pub localidade: String,
    #[serde(default)]
    pub uf: String,
    /// Present when the CEP does not exist. Documented as a boolean but
    /// newer deployments send the string `"true"`.
    #[serde(default)]
    pub erro: Option<Value>,
}

impl ViaCepResponse {
    pub fn is_not_found(&self) -> bool {
        match &self.erro {
            None | Some(Value::Null) => false,
            Some(Value::Bool(flag)) => *flag,
            // Any non-empty string flags the error, "false" included
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(_) => true,
        }
    }

    /// `None` when the service flagged the CEP as not found.
    pub fn into_result(self) -> Option<AddressLookupResult> {
        if self.is_not_found() {
            return None;
        }
        Some(AddressLookupResult {
            street: self.logradouro,
            district: self.bairro,
            city: self.localidade,
            state: self.uf,
        })
    }
}

/// A city or state value, sent either as plain text or as an object.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum NamedValue {
    Text(String),
    Object {
        #[serde(default)]
        name: Option<Value>,
        #[serde(default)]
        code: Option<Value>,
    },
    Other(Value),
}

impl NamedValue {
    fn name(&self) -> Option<String> {
        match self {
            NamedValue::Text(s) => Some(s.clone()),
            NamedValue::Object { name, .. } => name.as_ref().and_then(value_text),
            NamedValue::Other(_) => None,
        }
    }

    fn code(&self) -> Option<String> {
        match self {
            NamedValue::Text(s) => Some(s.clone()),
            NamedValue::Object { code, .. } => code.as_ref().and_then(value_text),
            NamedValue::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CnpjaCompany {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CnpjaAddress {
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    /// Usually a string ("1578", "S/N"), occasionally a bare number.
    #[serde(default)]
    pub number: Option<Value>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub city: Option<NamedValue>,
    #[serde(default)]
    pub state: Option<NamedValue>,
}

/// CNPJá `/office/{cnpj}` response (only the fields the form uses).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CnpjaOfficeResponse {
    #[serde(default)]
    pub tax_id: Option<Value>,
    #[serde(default)]
    pub company: Option<CnpjaCompany>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub address: Option<CnpjaAddress>,
}

impl CnpjaOfficeResponse {
    /// `None` when the response lacks the identifying `taxId`.
    pub fn into_result(self) -> Option<CompanyLookupResult> {
        let has_tax_id = match &self.tax_id {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        };
        if !has_tax_id {
            return None;
        }

        let address = self
            .address
            .map(|a| CompanyAddress {
                zip: a.zip,
                street: a.street,
                number: a.number.as_ref().and_then(value_text),
                details: a.details,
                district: a.district,
                city: a.city.as_ref().and_then(NamedValue::name),
                state: a.state.as_ref().and_then(NamedValue::code),
            })
            .unwrap_or_default();

        Some(CompanyLookupResult {
            legal_name: self.company.and_then(|c| c.name),
            trade_name: self.alias,
            address,
        })
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_individual_defaults() {
        let record = IndividualRecord::default();
        assert_eq!(record.contact.forma_contato, "ligacao");
        assert_eq!(record.contact.horario, "manha");
        assert_eq!(record.field(FormField::Nome), Some(""));
        assert_eq!(record.field(FormField::Cnpj), None);
    }

    #[test]
    fn test_business_cpf_routes_to_representative() {
        let mut record = BusinessRecord::default();
        *record.field_mut(FormField::Cpf).unwrap() = "123.456.789-00".to_string();
        assert_eq!(record.representative.cpf, "123.456.789-00");
        assert!(record.field_mut(FormField::Nome).is_none());
    }

    #[test]
    fn test_field_applies_to_mode() {
        assert!(FormField::Nome.applies_to(PersonType::Individual));
        assert!(!FormField::Nome.applies_to(PersonType::Business));
        assert!(FormField::Cnpj.applies_to(PersonType::Business));
        assert!(!FormField::Cnpj.applies_to(PersonType::Individual));
        assert!(FormField::Cep.applies_to(PersonType::Individual));
        assert!(FormField::Cpf.applies_to(PersonType::Business));
    }

    #[test]
    fn test_field_keys_match_serde_names() {
        let field: FormField = serde_json::from_value(json!("pontoReferencia")).unwrap();
        assert_eq!(field, FormField::PontoReferencia);
        assert_eq!(field.key(), "pontoReferencia");
        assert_eq!(
            serde_json::to_value(FormField::DataNascimento).unwrap(),
            json!("dataNascimento")
        );
    }

    #[test]
    fn test_record_serializes_flat() {
        let mut record = BusinessRecord::default();
        record.address.cep = "01310-100".to_string();
        record.representative.cargo = "Sócio".to_string();
        let value = serde_json::to_value(ContactRecord::Business(record)).unwrap();
        assert_eq!(value["cep"], "01310-100");
        assert_eq!(value["cargo"], "Sócio");
        assert_eq!(value["formaContato"], "ligacao");
        assert!(value.get("address").is_none());
    }

    #[test]
    fn test_missing_required() {
        let mut record = IndividualRecord::default();
        record.nome = "Maria".to_string();
        record.contact.email = "   ".to_string();
        let missing = ContactRecord::Individual(record).missing_required();
        assert_eq!(
            missing,
            vec![
                FormField::Cep,
                FormField::Numero,
                FormField::Telefone,
                FormField::Email
            ]
        );
    }

    #[test]
    fn test_viacep_not_found_shapes() {
        let bool_flag: ViaCepResponse = serde_json::from_value(json!({"erro": true})).unwrap();
        assert!(bool_flag.into_result().is_none());

        let string_flag: ViaCepResponse =
            serde_json::from_value(json!({"erro": "true"})).unwrap();
        assert!(string_flag.is_not_found());

        let false_string: ViaCepResponse =
            serde_json::from_value(json!({"erro": "false"})).unwrap();
        assert!(false_string.is_not_found());

        for cleared in [
            json!({"erro": false}),
            json!({"erro": ""}),
            json!({"erro": 0}),
            json!({"erro": null}),
        ] {
            let response: ViaCepResponse = serde_json::from_value(cleared).unwrap();
            assert!(!response.is_not_found());
        }

        let found: ViaCepResponse = serde_json::from_value(json!({
            "logradouro": "Avenida Paulista",
            "bairro": "Bela Vista",
            "localidade": "São Paulo",
            "uf": "SP"
        }))
        .unwrap();
        let result = found.into_result().unwrap();
        assert_eq!(result.street, "Avenida Paulista");
        assert_eq!(result.state, "SP");
    }

    #[test]
    fn test_cnpja_nested_city_and_state() {
        let response: CnpjaOfficeResponse = serde_json::from_value(json!({
            "taxId": "11222333000181",
            "company": { "name": "ACME LTDA" },
            "alias": "Acme",
            "address": {
                "zip": "01310100",
                "street": "Avenida Paulista",
                "number": 1000,
                "city": { "code": 3550308, "name": "São Paulo" },
                "state": { "code": "SP", "name": "São Paulo" }
            }
        }))
        .unwrap();
        let result = response.into_result().unwrap();
        assert_eq!(result.legal_name.as_deref(), Some("ACME LTDA"));
        assert_eq!(result.address.number.as_deref(), Some("1000"));
        assert_eq!(result.address.city.as_deref(), Some("São Paulo"));
        assert_eq!(result.address.state.as_deref(), Some("SP"));
        assert_eq!(result.address.details, None);
    }

    #[test]
    fn test_cnpja_plain_city_and_state() {
        let response: CnpjaOfficeResponse = serde_json::from_value(json!({
            "taxId": "11222333000181",
            "address": { "city": "Campinas", "state": "SP" }
        }))
        .unwrap();
        let result = response.into_result().unwrap();
        assert_eq!(result.address.city.as_deref(), Some("Campinas"));
        assert_eq!(result.address.state.as_deref(), Some("SP"));
    }

    #[test]
    fn test_cnpja_without_tax_id_is_ignored() {
        let response: CnpjaOfficeResponse =
            serde_json::from_value(json!({"message": "not found"})).unwrap();
        assert!(response.into_result().is_none());
    }

    #[test]
    fn test_company_merge_keeps_existing_values() {
        let mut record = BusinessRecord::default();
        record.nome_fantasia = "Nome Antigo".to_string();
        record.address.numero = "42".to_string();
        record.address.complemento = "Sala 3".to_string();

        let result = CompanyLookupResult {
            legal_name: Some("ACME LTDA".to_string()),
            trade_name: Some(String::new()),
            address: CompanyAddress {
                zip: Some("01310100".to_string()),
                number: None,
                street: Some("Avenida Paulista".to_string()),
                ..Default::default()
            },
        };
        record.apply_company_lookup(&result);

        assert_eq!(record.razao_social, "ACME LTDA");
        assert_eq!(record.nome_fantasia, "Nome Antigo");
        assert_eq!(record.address.cep, "01310-100");
        assert_eq!(record.address.endereco, "Avenida Paulista");
        assert_eq!(record.address.numero, "42");
        assert_eq!(record.address.complemento, "Sala 3");
    }
}

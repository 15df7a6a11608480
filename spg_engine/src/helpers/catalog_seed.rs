use spg_common::Money;

use crate::db_types::NewProduct;

/// The catalog a fresh store starts with.
pub fn default_catalog() -> Vec<NewProduct> {
    vec![
        NewProduct::new("apl001", "Măr", Money::from_cents(150), 40)
            .with_alias("weedulescu")
            .with_description("Mere crocante."),
        NewProduct::new("ban001", "Banane", Money::from_cents(240), 30)
            .with_alias("coxoleanu")
            .with_description("Banane bio."),
        NewProduct::new("cps001", "Căpșună", Money::from_cents(300), 50)
            .with_alias("3cemecescu")
            .with_description("Căpșuni aromate."),
        NewProduct::new("mnk001", "Mango Kent", Money::from_cents(450), 20)
            .with_alias("coxoleanu")
            .with_description("Mango dulce, copt."),
        NewProduct::new("pep001", "Pepene", Money::from_cents(550), 15)
            .with_alias("madalina")
            .with_description("Pepene roșu mare."),
        NewProduct::new("per001", "Pere", Money::from_cents(220), 30)
            .with_alias("ketaminescu")
            .with_description("Pere zemoase."),
        NewProduct::new("str001", "Struguri", Money::from_cents(280), 35)
            .with_alias("bobitele")
            .with_description("Struguri dulci."),
    ]
}

// src/services/invoice_service.rs

use rust_decimal::Decimal;
use std::{collections::HashMap, sync::Arc};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        i18n::I18nStore,
        response::{Page, PageQuery},
    },
    db::store::{CatalogStore, IngredientStore, InvoiceStore},
    middleware::i18n::Locale,
    models::{
        invoice::{
            InvoiceDetail, InvoiceLine, InvoicePreview, InvoiceSummary, InvoiceTotals, LineAdvisory,
            NewInvoice, NewInvoiceItem, RegisterInvoicePayload,
        },
        restaurant::Restaurant,
        supplier::SupplierItemForInvoice,
    },
    services::invoice_calculator::{advisory_message, compute_invoice, price_advisory},
};

#[derive(Clone)]
pub struct InvoiceService {
    invoices: Arc<dyn InvoiceStore>,
    ingredients: Arc<dyn IngredientStore>,
    catalog: Arc<dyn CatalogStore>,
}

/// Documento já resolvido contra os itens do fornecedor.
struct ResolvedInvoice {
    items: Vec<SupplierItemForInvoice>,
    totals: InvoiceTotals,
}

impl InvoiceService {
    pub fn new(
        invoices: Arc<dyn InvoiceStore>,
        ingredients: Arc<dyn IngredientStore>,
        catalog: Arc<dyn CatalogStore>,
    ) -> Self {
        Self { invoices, ingredients, catalog }
    }

    async fn resolve(&self, restaurant: &Restaurant, payload: &RegisterInvoicePayload) -> Result<ResolvedInvoice, AppError> {
        // 1. Fornecedor da conta dona do restaurante
        self.catalog
            .find_supplier(restaurant.owner_id, payload.supplier_id)
            .await?
            .ok_or(AppError::SupplierNotFound(payload.supplier_id))?;

        let known: HashMap<Uuid, SupplierItemForInvoice> = self
            .ingredients
            .supplier_items_for_invoice(restaurant.owner_id, payload.supplier_id)
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        // 2. Cada linha precisa de um item desse fornecedor e valores coerentes
        let hundred = Decimal::ONE_HUNDRED;
        for tax in payload.tax_percentage.iter().chain(payload.items.iter().filter_map(|i| i.tax_percentage.as_ref())) {
            if *tax < Decimal::ZERO || *tax > hundred {
                return Err(AppError::InvalidTaxPercentage(*tax));
            }
        }

        let mut items = Vec::with_capacity(payload.items.len());
        let mut lines = Vec::with_capacity(payload.items.len());
        for item in &payload.items {
            let supplier_item = known
                .get(&item.supplier_item_id)
                .cloned()
                .ok_or(AppError::SupplierItemMismatch(item.supplier_item_id))?;
            if item.conversion_factor_used <= Decimal::ZERO {
                return Err(AppError::InvalidConversionFactor(item.conversion_factor_used));
            }
            lines.push(InvoiceLine {
                quantity: item.quantity_purchased,
                unit_price: item.unit_price_purchased,
                tax_percentage: item.tax_percentage,
                conversion_factor: item.conversion_factor_used,
            });
            items.push(supplier_item);
        }

        let settings = &restaurant.settings;
        let totals = compute_invoice(
            &lines,
            settings.tax_apply_mode,
            payload.tax_percentage,
            settings.default_tax_percentage,
        )?;
        Ok(ResolvedInvoice { items, totals })
    }

    /// Totais e avisos de preço sem gravar nada. Os avisos saem no idioma do cliente.
    pub async fn preview(
        &self,
        restaurant: &Restaurant,
        payload: &RegisterInvoicePayload,
        locale: &Locale,
        i18n: &I18nStore,
    ) -> Result<InvoicePreview, AppError> {
        let resolved = self.resolve(restaurant, payload).await?;

        let advisories = payload
            .items
            .iter()
            .zip(&resolved.items)
            .enumerate()
            .filter_map(|(index, (line, item))| {
                let advisory = price_advisory(item.last_cost_base, line.conversion_factor_used, line.unit_price_purchased)?;
                let message = advisory_message(
                    &advisory,
                    &item.purchase_unit_name,
                    &item.base_unit_abbreviation,
                    &locale.0,
                    i18n,
                );
                Some(LineAdvisory {
                    line: index,
                    supplier_item_id: item.id,
                    advisory,
                    message,
                })
            })
            .collect();

        Ok(InvoicePreview { totals: resolved.totals, advisories })
    }

    pub async fn register(
        &self,
        restaurant: &Restaurant,
        user_id: Uuid,
        payload: RegisterInvoicePayload,
    ) -> Result<InvoiceDetail, AppError> {
        let ResolvedInvoice { items, totals } = self.resolve(restaurant, &payload).await?;
        if !totals.submittable {
            return Err(AppError::InvoiceNotSubmittable);
        }

        let mut new_items = Vec::with_capacity(items.len());
        for ((line, item), breakdown) in payload.items.iter().zip(&items).zip(&totals.lines) {
            let cost_per_base_unit = breakdown
                .cost_per_base_unit
                .ok_or(AppError::InvalidConversionFactor(line.conversion_factor_used))?;
            new_items.push(NewInvoiceItem {
                supplier_item_id: item.id,
                master_ingredient_id: item.master_ingredient_id,
                quantity_purchased: line.quantity_purchased,
                unit_price_purchased: line.unit_price_purchased,
                tax_percentage: breakdown.tax_percentage,
                conversion_factor_used: line.conversion_factor_used,
                subtotal: breakdown.subtotal,
                tax_amount: breakdown.tax_amount,
                base_quantity: breakdown.base_quantity,
                cost_per_base_unit,
            });
        }

        let invoice_id = self
            .invoices
            .register_invoice(NewInvoice {
                restaurant_id: restaurant.id,
                supplier_id: payload.supplier_id,
                supplier_invoice_number: payload.supplier_invoice_number.trim().to_string(),
                emission_date: payload.emission_date,
                notes: payload.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
                subtotal: totals.subtotal,
                total_tax: totals.total_tax,
                total_amount: totals.total_amount,
                created_by: user_id,
                items: new_items,
            })
            .await?;

        tracing::info!(
            "🧾 Fatura {} registrada no restaurante {} (total {})",
            invoice_id, restaurant.id, totals.total_amount
        );

        self.detail(restaurant.id, invoice_id).await
    }

    pub async fn list(&self, restaurant_id: Uuid, query: &PageQuery) -> Result<Page<InvoiceSummary>, AppError> {
        self.invoices.list_invoices(restaurant_id, query).await
    }

    pub async fn detail(&self, restaurant_id: Uuid, invoice_id: Uuid) -> Result<InvoiceDetail, AppError> {
        self.invoices
            .invoice_detail(restaurant_id, invoice_id)
            .await?
            .ok_or(AppError::InvoiceNotFound(invoice_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::store::Stores,
        models::{
            ingredient::{CreateIngredientPayload, MasterIngredientPayload, SupplierItemPayload, SupplierPayload},
            invoice::{PriceDirection, RegisterInvoiceItemPayload},
            restaurant::{OperationMode, RestaurantPayload, RestaurantSettings, TaxApplyMode},
        },
        services::{ingredient_service::IngredientService, inventory_service::InventoryService},
    };
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn d(v: &str) -> Decimal {
        Decimal::from_str(v).unwrap()
    }

    struct Fixture {
        stores: Stores,
        service: InvoiceService,
        restaurant: Restaurant,
        supplier_id: Uuid,
        supplier_item_id: Uuid,
        ingredient_id: Uuid,
    }

    // Arroz em gramas, comprado por kg a 1.800 (1,8 / g)
    async fn fixture(mode: TaxApplyMode) -> Fixture {
        let stores = Stores::memory();
        let owner = Uuid::new_v4();
        let owner_role = stores.roles.find_role_by_name("Owner").await.unwrap().unwrap();

        let settings = RestaurantSettings { tax_apply_mode: mode, ..RestaurantSettings::default() };
        let restaurant = stores
            .restaurants
            .create_restaurant(
                owner,
                &RestaurantPayload {
                    name: "La Esquina".into(),
                    address: None,
                    email: None,
                    phone_number: None,
                    operation_mode: OperationMode::Postpaid,
                    settings,
                },
                owner_role.id,
            )
            .await
            .unwrap();

        let units = stores.catalog.list_units().await.unwrap();
        let unit = |abbr: &str| units.iter().find(|u| u.abbreviation == abbr).unwrap().id;
        let doc = stores.catalog.list_document_types(Some("CO")).await.unwrap().remove(0);

        let ingredients = IngredientService::new(stores.ingredients.clone(), stores.catalog.clone());
        let created = ingredients
            .create(
                owner,
                CreateIngredientPayload {
                    master_ingredient: MasterIngredientPayload { name: "Arroz".into(), base_unit_id: unit("g") },
                    supplier: SupplierPayload {
                        id: None,
                        name: Some("Distribuidora Andina".into()),
                        document_type_id: Some(doc.id),
                        document_number: Some("900123456".into()),
                    },
                    supplier_item: SupplierItemPayload {
                        brand_name: None,
                        purchase_unit_name: "kg".into(),
                        conversion_factor: d("1"),
                        conversion_unit_id: unit("kg"),
                        total_price: d("1800"),
                    },
                },
            )
            .await
            .unwrap();

        Fixture {
            service: InvoiceService::new(stores.invoices.clone(), stores.ingredients.clone(), stores.catalog.clone()),
            supplier_id: created.supplier_item.supplier_id,
            supplier_item_id: created.supplier_item.id,
            ingredient_id: created.id,
            restaurant,
            stores,
        }
    }

    fn payload(f: &Fixture, qty: &str, price: &str, tax: Option<&str>) -> RegisterInvoicePayload {
        RegisterInvoicePayload {
            supplier_id: f.supplier_id,
            supplier_invoice_number: "FV-001".into(),
            emission_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            notes: None,
            tax_percentage: None,
            items: vec![RegisterInvoiceItemPayload {
                supplier_item_id: f.supplier_item_id,
                quantity_purchased: d(qty),
                unit_price_purchased: d(price),
                tax_percentage: tax.map(d),
                conversion_factor_used: d("1000"),
            }],
        }
    }

    #[tokio::test]
    async fn preview_flags_price_increase() {
        let f = fixture(TaxApplyMode::PerInvoice).await;
        let preview = f
            .service
            .preview(&f.restaurant, &payload(&f, "2", "2000", None), &Locale::default(), I18nStore::global())
            .await
            .unwrap();

        assert_eq!(preview.totals.subtotal, d("4000"));
        assert_eq!(preview.totals.total_tax, d("760"));
        assert_eq!(preview.advisories.len(), 1);
        let advisory = &preview.advisories[0];
        assert_eq!(advisory.advisory.direction, PriceDirection::Increased);
        assert_eq!(advisory.advisory.percentage, d("11.1"));
        assert_eq!(advisory.message, "Price increased 11.1% (+$200,00 / kg, +$0,20 / g)");
    }

    #[tokio::test]
    async fn per_item_mode_uses_line_tax() {
        let f = fixture(TaxApplyMode::PerItem).await;
        let preview = f
            .service
            .preview(&f.restaurant, &payload(&f, "2", "12000", Some("19")), &Locale::default(), I18nStore::global())
            .await
            .unwrap();
        assert_eq!(preview.totals.subtotal, d("24000"));
        assert_eq!(preview.totals.total_tax, d("4560"));
        assert_eq!(preview.totals.total_amount, d("28560"));
    }

    #[tokio::test]
    async fn register_updates_cost_and_stock() {
        let f = fixture(TaxApplyMode::PerInvoice).await;
        let user = Uuid::new_v4();

        let detail = f.service.register(&f.restaurant, user, payload(&f, "3", "2000", None)).await.unwrap();
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.subtotal, d("6000"));
        assert_eq!(detail.items[0].cost_per_base_unit, d("2"));

        // estoque ativado automaticamente com 3 kg = 3000 g
        let inventory = InventoryService::new(f.stores.inventory.clone(), f.stores.ingredients.clone(), false);
        let stock = inventory
            .list_stock(f.restaurant.id, &PageQuery::default(), &Default::default())
            .await
            .unwrap();
        let row = stock.content.iter().find(|s| s.master_ingredient_id == f.ingredient_id).unwrap();
        assert_eq!(row.current_stock, d("3000"));

        let items = f
            .stores
            .ingredients
            .supplier_items_for_invoice(f.restaurant.owner_id, f.supplier_id)
            .await
            .unwrap();
        assert_eq!(items[0].last_cost_base, Some(d("2")));

        let history = inventory.transactions(f.restaurant.id, row.id, &PageQuery::default()).await.unwrap();
        assert_eq!(history.content[0].invoice_id, Some(detail.id));

        // mesmo número para o mesmo fornecedor
        let dup = f.service.register(&f.restaurant, user, payload(&f, "1", "2000", None)).await;
        assert!(matches!(dup, Err(AppError::InvoiceAlreadyExists(_))));
    }

    #[tokio::test]
    async fn rejects_invalid_documents() {
        let f = fixture(TaxApplyMode::PerItem).await;
        let user = Uuid::new_v4();

        let zero_qty = f.service.register(&f.restaurant, user, payload(&f, "0", "2000", None)).await;
        assert!(matches!(zero_qty, Err(AppError::InvoiceNotSubmittable)));

        let bad_tax = f.service.register(&f.restaurant, user, payload(&f, "1", "2000", Some("120"))).await;
        assert!(matches!(bad_tax, Err(AppError::InvalidTaxPercentage(_))));

        let mut foreign = payload(&f, "1", "2000", None);
        foreign.items[0].supplier_item_id = Uuid::new_v4();
        let mismatch = f.service.register(&f.restaurant, user, foreign).await;
        assert!(matches!(mismatch, Err(AppError::SupplierItemMismatch(_))));

        let mut no_factor = payload(&f, "1", "2000", None);
        no_factor.items[0].conversion_factor_used = Decimal::ZERO;
        let factor = f.service.register(&f.restaurant, user, no_factor).await;
        assert!(matches!(factor, Err(AppError::InvalidConversionFactor(_))));

        let huge = f
            .service
            .register(&f.restaurant, user, payload(&f, "1000000000000000", "1000000000000000", None))
            .await;
        assert!(matches!(huge, Err(AppError::InvalidAmount)));
    }
}

//! Order receipt renderer
//!
//! Renders an order and its customer into ESC/POS data for an 80mm
//! receipt printer, and sends it over an open session.

use receipt_printer::{DeviceSession, EscPosBuilder};
use tracing::{error, info, instrument};

use crate::models::{Customer, Order, OrderLine};

/// Receipt renderer
pub struct ReceiptRenderer {
    width: usize,
    title: String,
}

impl ReceiptRenderer {
    /// Create a renderer for the given paper width (characters per line)
    pub fn new(width: usize, title: impl Into<String>) -> Self {
        Self {
            width,
            title: title.into(),
        }
    }

    /// Render a receipt to WPC1252-encoded ESC/POS bytes
    pub fn render(&self, order: &Order, customer: &Customer) -> Vec<u8> {
        self.compose(order, customer).build()
    }

    /// Render without encoding conversion
    pub fn render_raw(&self, order: &Order, customer: &Customer) -> Vec<u8> {
        self.compose(order, customer).build_raw()
    }

    fn compose(&self, order: &Order, customer: &Customer) -> EscPosBuilder {
        let mut b = EscPosBuilder::new(self.width);

        self.render_header(&mut b, order, customer);
        self.render_customer(&mut b, customer);
        self.render_lines(&mut b, &order.lines);
        self.render_footer(&mut b, order);

        b
    }

    /// Fast-glance line, title, order details and address block
    fn render_header(&self, b: &mut EscPosBuilder, order: &Order, customer: &Customer) {
        b.center();
        b.bold();
        b.double_size();
        b.line(&order.fast_info());
        b.reset_size();

        b.wrapped(&format!("Pedido n.{} {}", order.id, self.title));
        b.wrapped(&format!("Tipo do Pedido: {}", order.kind.label()));
        b.wrapped(&format!("Data de Entrega: {}", order.formatted_date()));
        b.wrapped(&format!("Hora de Entrega: {}", order.formatted_time()));

        if let Some(nif) = customer.nif {
            b.wrapped(&format!("NIF: {}", nif));
        }
        if let Some(ref locality) = customer.locality_name {
            b.wrapped(&format!("Localidade: {}", locality));
        }
        if !customer.full_address.trim().is_empty() {
            b.wrapped(&format!("Morada: {}", customer.full_address));
        }
        if let Some(ref indication) = customer.indication {
            b.wrapped(&format!("Indicação: {}", indication));
        }
        b.newline();
    }

    fn render_customer(&self, b: &mut EscPosBuilder, customer: &Customer) {
        b.center();
        b.bold();
        b.line("Informações do Cliente");
        b.left();
        b.bold_off();

        b.wrapped(&format!("Cliente: {}", customer.name));
        b.wrapped(&format!("Email: {}", customer.email));
        b.wrapped(&format!("Tel.: {}", customer.phone_number));
        b.newline();
    }

    fn render_lines(&self, b: &mut EscPosBuilder, lines: &[OrderLine]) {
        b.center();
        b.bold();
        b.line("Produtos do Pedido:");
        b.left();
        b.bold_off();
        b.sep_single();

        for item in lines {
            b.bold();
            b.line_lr(
                &format!("{}x {}", item.quantity, item.product.name),
                &item.price_label(),
            );
            b.bold_off();

            if !item.product.accompaniment.trim().is_empty() {
                b.wrapped(&item.product.accompaniment);
            }
            if !item.note.trim().is_empty() {
                b.wrapped(&format!("Nota: {}", item.note));
            }
            b.newline();
        }
    }

    fn render_footer(&self, b: &mut EscPosBuilder, order: &Order) {
        b.sep_single();
        b.bold();
        b.line(&format!("TOTAL: {:.2} EUR", order.total_price));
        b.bold_off();

        b.feed(3);
        b.cut();
    }

    /// Render and send one receipt
    ///
    /// On a send failure the session is closed; the caller must drop it
    /// and reconnect before the next attempt.
    #[instrument(skip_all, fields(order_id = order.id))]
    pub async fn print(
        &self,
        order: &Order,
        customer: &Customer,
        session: Option<&mut dyn DeviceSession>,
    ) -> bool {
        let Some(session) = session else {
            error!("No printer session");
            return false;
        };

        let data = self.render(order, customer);
        match session.send(&data).await {
            Ok(()) => {
                info!(bytes = data.len(), "Receipt printed");
                true
            }
            Err(e) => {
                error!(error = %e, "Printing receipt failed");
                if let Err(close_err) = session.close().await {
                    error!(error = %close_err, "Closing failed session");
                }
                false
            }
        }
    }
}

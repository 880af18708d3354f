use rust_decimal::Decimal;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// `(id, name, category, price in rupees, description, image_url)`
const CATALOG: &[(i32, &str, &str, i64, &str, &str)] = &[
    (22, "Smartphone", "Mobile Phones", 12000, "Latest model with high-resolution camera and fast processor.", "/image/phone.png"),
    (23, "Laptop", "Computers", 55999, "Powerful laptop with 16GB RAM and 512GB SSD.", "/image/laptop.jpeg"),
    (24, "Tablet", "Tablets", 13000, "Lightweight tablet with a stunning display and long battery life.", "/image/tab.avif"),
    (25, "Smartwatch", "Wearables", 5000, "Track your fitness and receive notifications on the go.", "/image/fit.jpg"),
    (26, "Wireless Headphones", "Audio", 2500, "Noise-canceling headphones with superior sound quality.", "/image/wirelessheadphones.jpg"),
    (27, "Bluetooth Speaker", "Audio", 3500, "Portable speaker with rich sound and long battery life.", "/image/speak.webp"),
    (28, "Digital Camera", "Cameras", 35000, "High-quality camera for stunning photography.", "/image/cam.png"),
    (29, "Gaming Console", "Gaming", 5000, "Next-gen gaming console with immersive graphics and exclusive games.", "/image/console.webp"),
    (30, "E-Reader", "E-Readers", 20000, "Lightweight e-reader with a glare-free display for reading anywhere.", "/image/epaper.png"),
    (31, "Drone", "Drones", 10000, "High-performance drone with HD camera and long flight time.", "/image/drone.jpeg"),
    (32, "Monitor", "Computers", 2500, "27-inch 4K monitor with vibrant colors and sharp details.", "/image/monitor1.jpg"),
    (33, "Printer", "Office", 18000, "All-in-one printer for home and office use.", "/image/printer.png"),
    (34, "External Hard Drive", "Storage", 5000, "1TB external hard drive for extra storage.", "/image/harddisk.png"),
    (35, "Router", "Networking", 1500, "High-speed Wi-Fi router for seamless connectivity.", "/image/router1.jpeg"),
    (36, "Keyboard", "Accessories", 4500, "Mechanical keyboard for gamers and typists.", "/image/keyboard.webp"),
    (37, "Mouse", "Accessories", 1600, "Ergonomic mouse for comfortable use.", "/image/mouse.jpeg"),
    (38, "Smart Bulb", "Smart Home", 250, "Wi-Fi enabled smart bulb for home automation.", "/image/bulb.jpg"),
    (39, "Power Bank", "Accessories", 1500, "10000mAh power bank for on-the-go charging.", "/image/power.jpeg"),
    (40, "VR Headset", "Gaming", 35000, "Immersive VR headset for gaming and entertainment.", "/image/vrhead.webp"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Products::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Products::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Products::Category).string_len(100).not_null())
                    .col(ColumnDef::new(Products::Price).decimal_len(10, 2).not_null())
                    .col(ColumnDef::new(Products::Description).text().not_null())
                    .col(ColumnDef::new(Products::ImageUrl).string_len(255).not_null())
                    .to_owned(),
            )
            .await?;

        let mut seed = Query::insert();
        seed.into_table(Products::Table).columns([
            Products::Id,
            Products::Name,
            Products::Category,
            Products::Price,
            Products::Description,
            Products::ImageUrl,
        ]);
        for &(id, name, category, rupees, description, image_url) in CATALOG {
            seed.values([
                id.into(),
                name.into(),
                category.into(),
                Decimal::new(rupees * 100, 2).into(),
                description.into(),
                image_url.into(),
            ])
            .map_err(|e| DbErr::Migration(e.to_string()))?;
        }
        manager.exec_stmt(seed).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Products {
    Table,
    Id,
    Name,
    Category,
    Price,
    Description,
    ImageUrl,
}

pub mod small_product_list;

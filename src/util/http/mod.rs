/// 從 HTML 元素取出文字與表格欄位
pub mod element;
